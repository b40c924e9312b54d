/// Errors raised by [`crate::Monitor`] lifecycle operations and by
/// [`crate::MonitorRegistry`] bookkeeping.
#[derive(thiserror::Error, Debug)]
pub enum MonitorError {
    #[error("monitor is already running")]
    AlreadyStarted,

    #[error("monitor is already registered with id {0}")]
    AlreadyRegistered(i64),

    #[error("monitor is not registered")]
    NotRegistered,
}

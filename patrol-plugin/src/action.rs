use std::time::Duration;

use async_trait::async_trait;

use crate::registry::Registry;

/// An effectful sink notified of a monitor's lifecycle transitions.
///
/// Every method may perform I/O and may fail. An `init` failure aborts the
/// monitor's startup; `fail`/`recover` failures are only logged and never
/// stop the loop. Implementations are expected to enforce their own
/// timeouts — the control loop does not deadline-guard action calls.
#[async_trait]
pub trait Actor: Send + Sync {
    /// Called once when the owning monitor starts, before the first probe.
    async fn init(&self, monitor_name: &str) -> Result<(), ActionError>;

    /// Called on a healthy -> failing transition.
    async fn fail(&self, monitor_name: &str, value: f64) -> Result<(), ActionError>;

    /// Called on a failing -> healthy transition, with the wall-clock
    /// duration the monitor spent failing.
    async fn recover(&self, monitor_name: &str, failure_duration: Duration) -> Result<(), ActionError>;

    /// A short human-readable description, used in logs.
    fn describe(&self) -> String;
}

/// Error returned by an [`Actor`] method. Always logged and swallowed by
/// the monitor loop; never propagated as a hard failure.
#[derive(thiserror::Error, Debug)]
#[error("{0}")]
pub struct ActionError(pub String);

impl From<String> for ActionError {
    fn from(s: String) -> Self {
        ActionError(s)
    }
}

impl From<&str> for ActionError {
    fn from(s: &str) -> Self {
        ActionError(s.to_owned())
    }
}

pub type ActionRegistry = Registry<dyn Actor>;

pub fn new_registry() -> ActionRegistry {
    Registry::new("action")
}

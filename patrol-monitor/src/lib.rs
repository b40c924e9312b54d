//! The `Monitor` control loop and the process-wide registry that tracks
//! running monitors by id.

pub mod error;
pub mod monitor;
pub mod registry;

pub use error::MonitorError;
pub use monitor::Monitor;
pub use registry::MonitorRegistry;

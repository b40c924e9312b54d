use thiserror::Error;

use crate::value::ValueError;

/// Errors a plugin constructor may return while building a configured
/// probe, filter, or action instance.
#[derive(Error, Debug)]
pub enum PluginError {
    #[error(transparent)]
    Value(#[from] ValueError),
    #[error("{0}")]
    Other(String),
}

/// Errors raised by [`crate::registry::Registry::construct`].
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },
    #[error(transparent)]
    Plugin(#[from] PluginError),
}

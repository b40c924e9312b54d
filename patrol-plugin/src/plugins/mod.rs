//! The default plugin set compiled into the agent: a minimal `exec` probe,
//! `exec` action, and `average` filter, so the registries are exercisable
//! without any out-of-tree plugins.

mod average_filter;
mod exec_action;
mod exec_probe;

use crate::Plugins;

/// Register the default `exec` probe, `exec` action, and `average` filter.
///
/// Must be called exactly once per process before the registries are read;
/// calling it twice would panic via duplicate registration.
pub fn register_defaults(plugins: &Plugins) {
    exec_probe::register(&plugins.probes);
    exec_action::register(&plugins.actions);
    average_filter::register(&plugins.filters);
}

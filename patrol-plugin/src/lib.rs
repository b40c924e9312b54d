//! Plugin contracts and name-addressed registries for probes, filters, and
//! actions, plus the typed configuration accessors constructors use to read
//! their parameters.

pub mod action;
pub mod error;
pub mod filter;
pub mod metrics;
pub mod plugins;
pub mod probe;
pub mod registry;
pub mod value;

use action::ActionRegistry;
use filter::FilterRegistry;
use probe::ProbeRegistry;

/// The three plugin registries an agent process holds, one per kind.
///
/// A single `Plugins` is built at startup, the default plugin set is
/// registered into it, and it is then shared (via `Arc`) between the
/// monitor factory and the `/register` HTTP handler.
pub struct Plugins {
    pub probes: ProbeRegistry,
    pub filters: FilterRegistry,
    pub actions: ActionRegistry,
}

impl Default for Plugins {
    fn default() -> Self {
        Self {
            probes: probe::new_registry(),
            filters: filter::new_registry(),
            actions: action::new_registry(),
        }
    }
}

impl Plugins {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a `Plugins` with the default `exec`/`average` plugin set
    /// already registered.
    pub fn with_defaults() -> Self {
        let plugins = Self::new();
        plugins::register_defaults(&plugins);
        plugins
    }
}

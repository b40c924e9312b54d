use crate::registry::Registry;

/// A stateful `float -> float` transform applied between a probe and the
/// acceptance-band comparison. Pure in the sense that it performs no I/O.
pub trait Filter: Send + Sync {
    /// Reset internal state. Called once when the owning monitor starts.
    fn init(&mut self);

    /// Feed in one probe sample and get back the filtered value to compare
    /// against the acceptance band.
    fn put(&mut self, value: f64) -> f64;

    /// A short human-readable description, used in logs.
    fn describe(&self) -> String;
}

pub type FilterRegistry = Registry<dyn Filter>;

pub fn new_registry() -> FilterRegistry {
    Registry::new("filter")
}

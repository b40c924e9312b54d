//! The process-wide table of registered monitors, addressed by a monotonic
//! integer id that is never reused.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::MonitorError;
use crate::monitor::{Monitor, UNREGISTERED_ID};

struct Inner {
    monitors: HashMap<i64, Arc<Monitor>>,
    next_id: i64,
}

/// Registered monitors, keyed by id. Ids are assigned in ascending order
/// starting at `0` and are never reused, even after the monitor holding one
/// is unregistered.
pub struct MonitorRegistry {
    inner: Mutex<Inner>,
}

impl Default for MonitorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                monitors: HashMap::new(),
                next_id: 0,
            }),
        }
    }

    /// Assign the next id to `monitor` and add it to the table.
    ///
    /// Fails if `monitor` already carries an id from a previous
    /// registration; a monitor must be unregistered before it can be
    /// registered again.
    pub fn register(&self, monitor: Arc<Monitor>) -> Result<i64, MonitorError> {
        if monitor.id() != UNREGISTERED_ID {
            return Err(MonitorError::AlreadyRegistered(monitor.id()));
        }

        let mut inner = self.inner.lock().expect("monitor registry lock poisoned");
        let id = inner.next_id;
        monitor.set_id(id);
        inner.monitors.insert(id, monitor);
        inner.next_id += 1;
        Ok(id)
    }

    pub fn find(&self, id: i64) -> Option<Arc<Monitor>> {
        self.inner
            .lock()
            .expect("monitor registry lock poisoned")
            .monitors
            .get(&id)
            .cloned()
    }

    /// Remove `monitor` from the table and reset its id to unregistered.
    ///
    /// Does not stop the monitor's loop; callers are expected to call
    /// [`Monitor::stop`] first.
    pub fn unregister(&self, monitor: &Monitor) -> Result<(), MonitorError> {
        let id = monitor.id();
        if id == UNREGISTERED_ID {
            return Err(MonitorError::NotRegistered);
        }

        let mut inner = self.inner.lock().expect("monitor registry lock poisoned");
        inner.monitors.remove(&id);
        monitor.set_id(UNREGISTERED_ID);
        Ok(())
    }

    /// All currently registered monitors, in ascending id order.
    pub fn list(&self) -> Vec<Arc<Monitor>> {
        let inner = self.inner.lock().expect("monitor registry lock poisoned");
        let mut entries: Vec<_> = inner.monitors.iter().collect();
        entries.sort_by_key(|(id, _)| **id);
        entries.into_iter().map(|(_, m)| Arc::clone(m)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use patrol_plugin::probe::{ProbeContext, Prober};

    struct NoopProbe;

    #[async_trait]
    impl Prober for NoopProbe {
        async fn probe(&self, _ctx: &ProbeContext) -> f64 {
            0.0
        }

        fn describe(&self) -> String {
            "probe:noop".into()
        }
    }

    fn monitor(name: &str) -> Arc<Monitor> {
        Monitor::new(
            name,
            Box::new(NoopProbe),
            None,
            vec![],
            Duration::from_secs(60),
            Duration::from_secs(5),
            0.0,
            0.0,
        )
    }

    #[test]
    fn ids_are_assigned_in_ascending_order() {
        let registry = MonitorRegistry::new();
        let a = registry.register(monitor("a")).unwrap();
        let b = registry.register(monitor("b")).unwrap();
        assert_eq!(a, 0);
        assert_eq!(b, 1);
    }

    #[test]
    fn ids_are_not_reused_after_unregister() {
        let registry = MonitorRegistry::new();
        let a = registry.register(monitor("a")).unwrap();
        let ma = registry.find(a).unwrap();
        registry.unregister(&ma).unwrap();

        let b = registry.register(monitor("b")).unwrap();
        assert_eq!(b, 1);
        assert!(registry.find(a).is_none());
    }

    #[test]
    fn registering_an_already_registered_monitor_fails() {
        let registry = MonitorRegistry::new();
        let m = monitor("a");
        registry.register(Arc::clone(&m)).unwrap();
        assert!(matches!(
            registry.register(Arc::clone(&m)).unwrap_err(),
            MonitorError::AlreadyRegistered(0)
        ));
    }

    #[test]
    fn unregistering_an_unregistered_monitor_fails() {
        let registry = MonitorRegistry::new();
        let m = monitor("a");
        assert!(matches!(
            registry.unregister(&m).unwrap_err(),
            MonitorError::NotRegistered
        ));
    }

    #[test]
    fn list_is_ordered_by_id() {
        let registry = MonitorRegistry::new();
        registry.register(monitor("a")).unwrap();
        registry.register(monitor("b")).unwrap();
        registry.register(monitor("c")).unwrap();

        let names: Vec<_> = registry.list().iter().map(|m| m.name().to_owned()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}

//! Name-addressed factory tables for probes, filters, and actions.
//!
//! A `Registry<T>` maps a plugin kind name (e.g. `"exec"`) to a constructor
//! closure. Registration happens once per kind during process init;
//! construction happens on every monitor build and must be safe for
//! concurrent use.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::RegistryError;
use crate::value::Params;

type Ctor<T> = Arc<dyn Fn(&Params) -> Result<Box<T>, crate::error::PluginError> + Send + Sync>;

pub struct Registry<T: ?Sized> {
    kind: &'static str,
    inner: Mutex<HashMap<String, Ctor<T>>>,
}

impl<T: ?Sized> Registry<T> {
    /// `kind` is a human-readable label (`"probe"`, `"filter"`, `"action"`)
    /// used in panic messages and not-found errors.
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Register a constructor under `name`.
    ///
    /// Duplicate registration of the same name is a programming error: it
    /// aborts the process rather than being reported as a `Result`, since it
    /// can only happen by mis-wiring the compiled-in plugin set.
    pub fn register<F>(&self, name: &str, ctor: F)
    where
        F: Fn(&Params) -> Result<Box<T>, crate::error::PluginError> + Send + Sync + 'static,
    {
        let mut map = self.inner.lock().expect("plugin registry lock poisoned");
        if map.contains_key(name) {
            panic!("duplicate {} registration: {name}", self.kind);
        }
        map.insert(name.to_owned(), Arc::new(ctor));
    }

    /// Construct a named plugin instance from `params`.
    ///
    /// Fails with [`RegistryError::NotFound`] for an unknown name, otherwise
    /// propagates the constructor's own error verbatim. No partial state is
    /// retained on constructor failure: the lock is released before the
    /// constructor runs, so a slow or failing constructor never blocks other
    /// lookups.
    pub fn construct(&self, name: &str, params: &Params) -> Result<Box<T>, RegistryError> {
        let ctor = {
            let map = self.inner.lock().expect("plugin registry lock poisoned");
            map.get(name).cloned()
        };
        match ctor {
            Some(ctor) => Ok(ctor(params)?),
            None => Err(RegistryError::NotFound {
                kind: self.kind,
                name: name.to_owned(),
            }),
        }
    }

    /// Whether `name` currently has a registered constructor.
    pub fn contains(&self, name: &str) -> bool {
        self.inner
            .lock()
            .expect("plugin registry lock poisoned")
            .contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PluginError;

    trait Widget: Send + Sync {
        fn label(&self) -> &str;
    }

    struct StaticWidget(String);
    impl Widget for StaticWidget {
        fn label(&self) -> &str {
            &self.0
        }
    }

    #[test]
    fn construct_unknown_kind_is_not_found() {
        let registry: Registry<dyn Widget> = Registry::new("widget");
        let err = registry.construct("nope", &Params::new()).unwrap_err();
        assert!(matches!(err, RegistryError::NotFound { name, .. } if name == "nope"));
    }

    #[test]
    fn construct_propagates_constructor_error_verbatim() {
        let registry: Registry<dyn Widget> = Registry::new("widget");
        registry.register("broken", |_| Err(PluginError::Other("boom".into())));
        let err = registry.construct("broken", &Params::new()).unwrap_err();
        match err {
            RegistryError::Plugin(PluginError::Other(msg)) => assert_eq!(msg, "boom"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    #[should_panic(expected = "duplicate widget registration: dup")]
    fn duplicate_registration_panics() {
        let registry: Registry<dyn Widget> = Registry::new("widget");
        registry.register("dup", |_| Ok(Box::new(StaticWidget("a".into()))));
        registry.register("dup", |_| Ok(Box::new(StaticWidget("b".into()))));
    }

    #[test]
    fn successful_construct_returns_instance() {
        let registry: Registry<dyn Widget> = Registry::new("widget");
        registry.register("ok", |_| Ok(Box::new(StaticWidget("hi".into()))));
        let w = registry.construct("ok", &Params::new()).unwrap();
        assert_eq!(w.label(), "hi");
    }

    #[test]
    fn construct_is_usable_concurrently() {
        use std::thread;

        let registry = Arc::new({
            let r: Registry<dyn Widget> = Registry::new("widget");
            r.register("shared", |_| Ok(Box::new(StaticWidget("shared".into()))));
            r
        });

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                thread::spawn(move || {
                    let w = registry.construct("shared", &Params::new()).unwrap();
                    assert_eq!(w.label(), "shared");
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }
    }
}

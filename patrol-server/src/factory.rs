//! Builds a [`Monitor`] from a parsed [`MonitorDefinition`] by resolving its
//! probe, filter, and actions through the plugin registries.

use std::sync::Arc;
use std::time::Duration;

use patrol_monitor::Monitor;
use patrol_plugin::error::RegistryError;
use patrol_plugin::Plugins;

use crate::definition::MonitorDefinition;

#[derive(thiserror::Error, Debug)]
pub enum FactoryError {
    #[error("{name}: {source} in probe")]
    Probe {
        name: String,
        #[source]
        source: RegistryError,
    },

    #[error("{name}: {source} in filter")]
    Filter {
        name: String,
        #[source]
        source: RegistryError,
    },

    #[error("{name}: {source} in action {kind}")]
    Action {
        name: String,
        kind: String,
        #[source]
        source: RegistryError,
    },

    #[error("{name}: invalid min/max range")]
    InvalidRange { name: String },
}

/// Resolve every plugin named in `def`, apply interval/timeout defaults,
/// validate the acceptance band, and assemble the `Monitor`. The returned
/// monitor is unregistered (`id == -1`) and not started.
pub fn create_monitor(
    def: &MonitorDefinition,
    plugins: &Plugins,
    default_interval: Duration,
    default_timeout: Duration,
) -> Result<Arc<Monitor>, FactoryError> {
    let probe = plugins
        .probes
        .construct(&def.probe.kind, &def.probe.params)
        .map_err(|source| FactoryError::Probe {
            name: def.name.clone(),
            source,
        })?;

    let filter = match &def.filter {
        Some(spec) => Some(
            plugins
                .filters
                .construct(&spec.kind, &spec.params)
                .map_err(|source| FactoryError::Filter {
                    name: def.name.clone(),
                    source,
                })?,
        ),
        None => None,
    };

    let mut actions = Vec::with_capacity(def.actions.len());
    for spec in &def.actions {
        let action = plugins
            .actions
            .construct(&spec.kind, &spec.params)
            .map_err(|source| FactoryError::Action {
                name: def.name.clone(),
                kind: spec.kind.clone(),
                source,
            })?;
        actions.push(action);
    }

    if def.min > def.max {
        return Err(FactoryError::InvalidRange {
            name: def.name.clone(),
        });
    }

    let interval = match def.interval {
        None | Some(0) => default_interval,
        Some(secs) => Duration::from_secs(secs),
    };
    let timeout = match def.timeout {
        None | Some(0) => default_timeout,
        Some(secs) => Duration::from_secs(secs),
    };

    Ok(Monitor::new(
        def.name.clone(),
        probe,
        filter,
        actions,
        interval,
        timeout,
        def.min,
        def.max,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::PluginSpec;
    use patrol_plugin::value::Params;

    fn plugins() -> Plugins {
        Plugins::with_defaults()
    }

    fn exec_def(name: &str, min: f64, max: f64) -> MonitorDefinition {
        let mut params = Params::new();
        params.insert(
            "command".into(),
            patrol_plugin::value::Value::String("/bin/true".into()),
        );
        MonitorDefinition {
            name: name.to_owned(),
            probe: PluginSpec {
                kind: "exec".into(),
                params,
            },
            filter: None,
            actions: vec![],
            interval: None,
            timeout: None,
            min,
            max,
        }
    }

    #[test]
    fn builds_a_monitor_with_defaults_applied() {
        let def = exec_def("m1", 0.0, 0.0);
        let monitor = create_monitor(
            &def,
            &plugins(),
            Duration::from_secs(60),
            Duration::from_secs(59),
        )
        .unwrap();
        assert_eq!(monitor.name(), "m1");
        assert_eq!(monitor.interval(), Duration::from_secs(60));
        assert_eq!(monitor.timeout(), Duration::from_secs(59));
    }

    #[test]
    fn invalid_range_is_rejected() {
        let def = exec_def("m1", 1.0, 0.0);
        let err = create_monitor(
            &def,
            &plugins(),
            Duration::from_secs(60),
            Duration::from_secs(59),
        )
        .unwrap_err();
        assert!(matches!(err, FactoryError::InvalidRange { .. }));
    }

    #[test]
    fn unknown_probe_kind_is_reported_with_monitor_name() {
        let mut def = exec_def("m1", 0.0, 0.0);
        def.probe.kind = "no-such-probe".into();
        let err = create_monitor(
            &def,
            &plugins(),
            Duration::from_secs(60),
            Duration::from_secs(59),
        )
        .unwrap_err();
        match err {
            FactoryError::Probe { name, .. } => assert_eq!(name, "m1"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

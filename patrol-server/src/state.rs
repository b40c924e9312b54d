use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use patrol_monitor::MonitorRegistry;
use patrol_plugin::Plugins;

use crate::config::Config;
use crate::verbosity::VerbosityHandle;

/// Shared state reachable from every HTTP handler.
pub struct AppState {
    pub plugins: Plugins,
    pub monitors: MonitorRegistry,
    pub config: Config,
    pub verbosity: VerbosityHandle,
    pub metrics_handle: PrometheusHandle,
}

pub type SharedState = Arc<AppState>;

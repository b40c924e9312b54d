//! Runtime-adjustable log verbosity, exposed over `/verbosity`.

use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

/// Handle to the live `EnvFilter` layer, reloadable from a handler without
/// restarting the process.
pub struct VerbosityHandle {
    handle: reload::Handle<EnvFilter, Registry>,
    current: Mutex<String>,
}

impl VerbosityHandle {
    pub fn get(&self) -> String {
        self.current
            .lock()
            .expect("verbosity mutex poisoned")
            .clone()
    }

    pub fn set(&self, level: &str) -> Result<(), String> {
        let filter = EnvFilter::try_new(level).map_err(|e| e.to_string())?;
        self.handle.reload(filter).map_err(|e| e.to_string())?;
        *self.current.lock().expect("verbosity mutex poisoned") = level.to_owned();
        Ok(())
    }
}

/// Install the global `tracing` subscriber and return a [`VerbosityHandle`]
/// that the `/verbosity` endpoint uses to change the filter at runtime.
pub fn init_tracing(default_level: &str) -> VerbosityHandle {
    let (filter_layer, reload_handle) = reload::Layer::new(EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt::layer())
        .init();

    VerbosityHandle {
        handle: reload_handle,
        current: Mutex::new(default_level.to_owned()),
    }
}

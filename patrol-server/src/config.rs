use envconfig::Envconfig;

/// Server process configuration, read from the environment with the same
/// `envconfig`-derived shape as the rest of the workspace.
#[derive(Envconfig, Clone)]
pub struct Config {
    #[envconfig(from = "BIND_HOST", default = "127.0.0.1")]
    pub host: String,

    #[envconfig(from = "BIND_PORT", default = "3838")]
    pub port: u16,

    /// Directory of `*.toml` monitor definitions loaded at startup. Unset
    /// means no definitions are preloaded; monitors can still be added via
    /// `POST /register`.
    #[envconfig(from = "CONFIG_DIR")]
    pub config_dir: Option<String>,

    #[envconfig(from = "DEFAULT_INTERVAL_SECS", default = "60")]
    pub default_interval_secs: u64,

    #[envconfig(from = "DEFAULT_TIMEOUT_SECS", default = "59")]
    pub default_timeout_secs: u64,
}

impl Config {
    /// Produce a host:port address for binding a `TcpListener`.
    pub fn bind(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

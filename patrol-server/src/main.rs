use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use envconfig::Envconfig;
use eyre::{Context, Result};
use patrol_monitor::MonitorRegistry;
use patrol_plugin::Plugins;

mod config;
mod definition;
mod factory;
mod handlers;
mod state;
mod verbosity;

use config::Config;
use state::AppState;

#[derive(Parser)]
#[command(name = "patrol", version, about = "Probe/filter/action monitoring agent")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the agent: load configured monitors and serve the control plane.
    Serve {
        /// Directory of `*.toml` monitor definitions, overrides CONFIG_DIR.
        #[arg(short = 'd', long)]
        config_dir: Option<PathBuf>,

        /// Address to bind the control plane to, overrides BIND_HOST/BIND_PORT.
        #[arg(short = 's', long)]
        listen: Option<String>,
    },

    /// Talk to a running agent's REST control plane.
    Client {
        #[arg(short = 'l', long, env = "PATROL_SERVER", default_value = "http://127.0.0.1:3838")]
        server: String,

        #[command(subcommand)]
        action: ClientAction,
    },
}

#[derive(Subcommand)]
enum ClientAction {
    /// List all registered monitors.
    List,
    /// Show one monitor's status.
    Show { id: i64 },
    /// Start a stopped monitor.
    Start { id: i64 },
    /// Stop a running monitor.
    Stop { id: i64 },
    /// Stop and unregister a monitor.
    Unregister { id: i64 },
    /// Register a new monitor from a JSON definition file.
    Register { file: PathBuf },
    /// Show, or set, the agent's log verbosity.
    Verbosity { level: Option<String> },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Serve {
        config_dir: None,
        listen: None,
    }) {
        Command::Serve { config_dir, listen } => serve(config_dir, listen).await,
        Command::Client { server, action } => client(server, action).await,
    }
}

async fn serve(config_dir_override: Option<PathBuf>, listen_override: Option<String>) -> Result<()> {
    let mut config = Config::init_from_env().context("failed to load configuration from env")?;
    if let Some(dir) = config_dir_override {
        config.config_dir = Some(dir.display().to_string());
    }
    let bind = listen_override.unwrap_or_else(|| config.bind());

    let verbosity = verbosity::init_tracing("info");
    let metrics_handle = patrol_plugin::metrics::setup_metrics_recorder();

    let plugins = Plugins::with_defaults();
    let monitors = MonitorRegistry::new();

    if let Some(dir) = &config.config_dir {
        let defs = definition::load_dir(std::path::Path::new(dir))
            .with_context(|| format!("loading monitor definitions from {dir}"))?;
        for def in defs {
            let name = def.name.clone();
            let monitor = factory::create_monitor(
                &def,
                &plugins,
                Duration::from_secs(config.default_interval_secs),
                Duration::from_secs(config.default_timeout_secs),
            )
            .with_context(|| format!("building monitor {name}"))?;

            let id = monitors
                .register(Arc::clone(&monitor))
                .with_context(|| format!("registering monitor {name}"))?;
            monitor
                .start()
                .await
                .with_context(|| format!("starting monitor {name}"))?;
            tracing::info!(monitor_id = id, name = %name, "loaded monitor");
        }
    }

    let state = Arc::new(AppState {
        plugins,
        monitors,
        config,
        verbosity,
        metrics_handle,
    });

    let app = handlers::app(Arc::clone(&state));
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    tracing::info!(%bind, "patrol server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server error")?;

    for monitor in state.monitors.list() {
        monitor.stop().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

/// Informational version header attached to every client request. The
/// server accepts it but never validates it against its own version.
const VERSION_HEADER: &str = "X-Patrol-Version";

async fn client(server: String, action: ClientAction) -> Result<()> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        VERSION_HEADER,
        env!("CARGO_PKG_VERSION").parse().expect("version is valid header value"),
    );
    let http = reqwest::Client::builder()
        .default_headers(headers)
        .build()
        .context("building http client")?;

    match action {
        ClientAction::List => {
            let body = http.get(format!("{server}/list")).send().await?.text().await?;
            println!("{body}");
        }
        ClientAction::Show { id } => {
            let body = http
                .get(format!("{server}/monitor/{id}"))
                .send()
                .await?
                .text()
                .await?;
            println!("{body}");
        }
        ClientAction::Start { id } => {
            http.post(format!("{server}/monitor/{id}"))
                .body("start")
                .send()
                .await?
                .error_for_status()?;
        }
        ClientAction::Stop { id } => {
            http.post(format!("{server}/monitor/{id}"))
                .body("stop")
                .send()
                .await?
                .error_for_status()?;
        }
        ClientAction::Unregister { id } => {
            http.delete(format!("{server}/monitor/{id}"))
                .send()
                .await?
                .error_for_status()?;
        }
        ClientAction::Register { file } => {
            let body = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let resp = http
                .post(format!("{server}/register"))
                .header("content-type", "application/json")
                .body(body)
                .send()
                .await?;
            println!("{}", resp.text().await?);
        }
        ClientAction::Verbosity { level } => match level {
            Some(level) => {
                http.post(format!("{server}/verbosity"))
                    .body(level)
                    .send()
                    .await?
                    .error_for_status()?;
            }
            None => {
                let body = http.get(format!("{server}/verbosity")).send().await?.text().await?;
                println!("{body}");
            }
        },
    }

    Ok(())
}

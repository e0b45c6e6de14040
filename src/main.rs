//! slotd: worker-pool HTTP server.
//!
//! # Architecture Overview
//!
//! ```text
//!     ┌──────────────────────────────────────────────────────────────┐
//!     │                          SLOTD                               │
//!     │                                                              │
//!     │  kernel backlog                                              │
//!     │      │                                                       │
//!     │      ▼                                                       │
//!     │  ┌─────────┐   ┌──────────┐   ┌──────────┐   ┌───────────┐   │
//!     │  │ workers │──▶│   net    │──▶│   http   │──▶│  routing  │   │
//!     │  │  slot   │   │ listener │   │ dispatch │   │ registry  │   │
//!     │  └─────────┘   └──────────┘   └────┬─────┘   └─────┬─────┘   │
//!     │       ▲                            │               ▼         │
//!     │       │ SlotGuard drop             │         ┌───────────┐   │
//!     │       └────────────────────────────┘◀────────│    app    │   │
//!     │                                              │ handlers  │   │
//!     │                                              └───────────┘   │
//!     │  ┌────────────────────────────────────────────────────────┐  │
//!     │  │ config │ credentials │ observability │ lifecycle       │  │
//!     │  └────────────────────────────────────────────────────────┘  │
//!     └──────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use slotd::config::loader::{apply_env, read_config_file};
use slotd::config::validation::validate_config;
use slotd::config::{ConfigError, ServerConfig};
use slotd::lifecycle::{signals, startup, Shutdown, StartupError};
use slotd::observability::{logging, metrics};
use slotd::{app, credentials};

#[derive(Debug, Parser)]
#[command(name = "slotd", version, about = "Worker-pool HTTP server")]
struct Cli {
    /// TOML configuration file. Environment variables and flags override it.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Port to bind on 0.0.0.0 (overrides PORT).
    #[arg(long)]
    port: Option<u16>,

    /// Number of worker slots (overrides WEB_CONCURRENCY).
    #[arg(long)]
    workers: Option<usize>,

    /// Per-request timeout in milliseconds (overrides REQUEST_TIMEOUT_MS).
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Application to serve (overrides APP_MODULE).
    #[arg(long)]
    app: Option<String>,

    /// Refuse to start if the credential is missing.
    #[arg(long)]
    strict_preflight: bool,

    /// Validate configuration and run the preflight, then exit.
    #[arg(long)]
    check: bool,
}

impl Cli {
    fn apply(&self, config: &mut ServerConfig) {
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(workers) = self.workers {
            config.workers.count = workers;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.workers.request_timeout_ms = timeout_ms;
        }
        if let Some(app) = &self.app {
            config.app = app.clone();
        }
        if self.strict_preflight {
            config.credentials.strict_preflight = true;
        }
    }
}

/// Defaults, then file, then environment, then flags.
fn load(cli: &Cli) -> Result<ServerConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => read_config_file(path)?,
        None => ServerConfig::default(),
    };
    apply_env(&mut config, |name| std::env::var(name).ok())?;
    cli.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logging is not up yet; report straight to stderr.
    let config = match load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("slotd: configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = logging::init(&config.observability) {
        eprintln!("slotd: {}", e);
        return ExitCode::FAILURE;
    }

    match run(config, cli.check).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Fatal startup error");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: ServerConfig, check: bool) -> Result<(), StartupError> {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        app = %config.app,
        port = config.listener.port,
        workers = config.workers.count,
        request_timeout_ms = config.workers.request_timeout_ms,
        "slotd starting"
    );

    let registry = app::registry_for(&config.app)
        .ok_or_else(|| StartupError::UnknownApp(config.app.clone()))?;

    if check {
        credentials::preflight(&config.credentials)?;
        tracing::info!(routes = registry.len(), "Configuration OK");
        return Ok(());
    }

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address)?;
    }

    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();
    tokio::spawn(async move { signals::forward_to(&shutdown).await });

    startup::start(config, registry, signal).await
}

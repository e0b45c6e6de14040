//! Startup orchestration.
//!
//! # Responsibilities
//! - Run the credential preflight
//! - Bind the listener
//! - Build the server and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal and maps to a non-zero exit
//! - Preflight runs before bind, so a strict failure never accepts traffic
//! - Listener starts last (traffic only when ready)

use thiserror::Error;

use super::shutdown::ShutdownSignal;
use crate::config::ServerConfig;
use crate::credentials::{self, CredentialError};
use crate::http::HttpServer;
use crate::net::{BindError, Listener};
use crate::routing::HandlerRegistry;

/// Anything that stops the process once configuration and logging are up.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("unknown application module: {0}")]
    UnknownApp(String),

    #[error("credential preflight failed: {0}")]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Bind(#[from] BindError),

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Preflight, bind, then serve `registry` until `shutdown` fires.
pub async fn start(
    config: ServerConfig,
    registry: HandlerRegistry,
    shutdown: ShutdownSignal,
) -> Result<(), StartupError> {
    credentials::preflight(&config.credentials)?;

    let listener = Listener::bind(&config.listener)?;
    let server = HttpServer::new(config, registry);
    server.run(listener, shutdown).await?;
    Ok(())
}

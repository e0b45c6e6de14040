//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration for the serving core.
///
/// Built once at startup and never mutated afterwards; subsystems receive it
/// (or a section of it) explicitly.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Name of the application whose handler registry is served.
    pub app: String,

    /// Listener configuration (port, backlog).
    pub listener: ListenerConfig,

    /// Worker pool sizing and timeouts.
    pub workers: WorkerConfig,

    /// Mounted credential location and preflight policy.
    pub credentials: CredentialsConfig,

    /// Built-in health endpoint.
    pub health: HealthConfig,

    /// Request limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            app: "diagnostics".to_string(),
            listener: ListenerConfig::default(),
            workers: WorkerConfig::default(),
            credentials: CredentialsConfig::default(),
            health: HealthConfig::default(),
            limits: LimitsConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Per-request deadline.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.workers.request_timeout_ms)
    }

    /// How long shutdown waits for in-flight requests.
    pub fn graceful_timeout(&self) -> Duration {
        Duration::from_millis(
            self.workers
                .graceful_timeout_ms
                .unwrap_or(self.workers.request_timeout_ms),
        )
    }

    /// Upper bound on the lifetime of a single connection, covering slow
    /// header reads and slow response writes as well as the handler itself.
    pub fn connection_deadline(&self) -> Duration {
        self.request_timeout() * 2
    }

    /// Health endpoint path, if the endpoint is enabled.
    pub fn health_path(&self) -> Option<&str> {
        if self.health.enabled && !self.health.path.is_empty() {
            Some(&self.health.path)
        } else {
            None
        }
    }
}

/// Listener configuration.
///
/// The listening address is always the wildcard interface; only the port
/// is configurable.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// TCP port (normally supplied by the platform through `PORT`).
    pub port: u16,

    /// Listen backlog. Connections beyond the worker count wait here.
    pub backlog: u32,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            backlog: 1024,
        }
    }
}

/// Worker pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Number of worker slots (maximum concurrent requests).
    pub count: usize,

    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,

    /// Shutdown grace window in milliseconds. Defaults to the request timeout.
    pub graceful_timeout_ms: Option<u64>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            count: 1,
            request_timeout_ms: 30_000,
            graceful_timeout_ms: None,
        }
    }
}

/// Credential provisioning configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// Where the platform mounts the service-account key.
    pub path: PathBuf,

    /// Refuse to start when the credential is missing.
    pub strict_preflight: bool,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/secrets/serviceAccountKey.json"),
            strict_preflight: false,
        }
    }
}

/// Health endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Serve the built-in health endpoint.
    pub enabled: bool,

    /// Path the endpoint is mounted at.
    pub path: String,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/healthz".to_string(),
        }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 1024 * 1024, // 1MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins if set.
    pub log_level: String,

    /// Enable the Prometheus scrape listener.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: SocketAddr,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: SocketAddr::from(([0, 0, 0, 0], 9090)),
        }
    }
}

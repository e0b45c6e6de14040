//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::ServerConfig;
use crate::config::validation::ValidationError;

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env {
        var: &'static str,
        value: String,
        reason: String,
    },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, value, reason } => {
                write!(f, "Invalid {}={:?}: {}", var, value, reason)
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Environment variables understood by the loader.
pub mod env {
    pub const PORT: &str = "PORT";
    pub const APP_MODULE: &str = "APP_MODULE";
    pub const WEB_CONCURRENCY: &str = "WEB_CONCURRENCY";
    pub const REQUEST_TIMEOUT_MS: &str = "REQUEST_TIMEOUT_MS";
    pub const GRACEFUL_TIMEOUT_MS: &str = "GRACEFUL_TIMEOUT_MS";
    pub const CREDENTIALS_PATH: &str = "CREDENTIALS_PATH";
    pub const STRICT_PREFLIGHT: &str = "STRICT_PREFLIGHT";
    pub const HEALTH_PATH: &str = "HEALTH_PATH";
}

/// Parse a TOML configuration file. Validation runs after the environment
/// and CLI overlays, see
/// [`validate_config`](crate::config::validation::validate_config).
pub fn read_config_file(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Overlay environment variables onto `config`.
///
/// `lookup` abstracts `std::env::var` so the mapping can be tested without
/// touching the real process environment. Variables that are set but cannot
/// be parsed are errors; unset variables leave the field alone.
pub fn apply_env<F>(config: &mut ServerConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(env::PORT) {
        config.listener.port = parse_var(env::PORT, &value)?;
    }
    if let Some(value) = lookup(env::APP_MODULE) {
        config.app = value.trim().to_string();
    }
    if let Some(value) = lookup(env::WEB_CONCURRENCY) {
        config.workers.count = parse_var(env::WEB_CONCURRENCY, &value)?;
    }
    if let Some(value) = lookup(env::REQUEST_TIMEOUT_MS) {
        config.workers.request_timeout_ms = parse_var(env::REQUEST_TIMEOUT_MS, &value)?;
    }
    if let Some(value) = lookup(env::GRACEFUL_TIMEOUT_MS) {
        config.workers.graceful_timeout_ms = Some(parse_var(env::GRACEFUL_TIMEOUT_MS, &value)?);
    }
    if let Some(value) = lookup(env::CREDENTIALS_PATH) {
        config.credentials.path = PathBuf::from(value);
    }
    if let Some(value) = lookup(env::STRICT_PREFLIGHT) {
        config.credentials.strict_preflight = parse_flag(env::STRICT_PREFLIGHT, &value)?;
    }
    if let Some(value) = lookup(env::HEALTH_PATH) {
        // An empty value switches the endpoint off.
        config.health.enabled = !value.trim().is_empty();
        config.health.path = value.trim().to_string();
    }
    Ok(())
}

fn parse_var<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Env {
        var,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::Env {
            var,
            value: value.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}

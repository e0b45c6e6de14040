//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (workers >= 1, timeouts > 0)
//! - Check path shapes for the health endpoint
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::ServerConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("workers.count must be at least 1")]
    NoWorkers,

    #[error("workers.request_timeout_ms must be greater than 0")]
    ZeroRequestTimeout,

    #[error("listener.backlog must be greater than 0")]
    ZeroBacklog,

    #[error("health.path must start with '/' (got {0:?})")]
    HealthPath(String),

    #[error("limits.max_body_bytes must be greater than 0")]
    ZeroBodyLimit,

    #[error("app must not be empty")]
    EmptyApp,

    #[error("credentials.path must not be empty")]
    EmptyCredentialPath,
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.workers.count == 0 {
        errors.push(ValidationError::NoWorkers);
    }
    if config.workers.request_timeout_ms == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }
    if config.listener.backlog == 0 {
        errors.push(ValidationError::ZeroBacklog);
    }
    if let Some(path) = config.health_path() {
        if !path.starts_with('/') {
            errors.push(ValidationError::HealthPath(path.to_string()));
        }
    }
    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }
    if config.app.trim().is_empty() {
        errors.push(ValidationError::EmptyApp);
    }
    if config.credentials.path.as_os_str().is_empty() {
        errors.push(ValidationError::EmptyCredentialPath);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

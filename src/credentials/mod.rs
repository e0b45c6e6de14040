//! Credential provisioning.
//!
//! # Data Flow
//! ```text
//! Platform mounts secret (outside this process)
//!     → startup: preflight() checks secret_available(path)
//!         strict:  missing → fatal, process exits non-zero
//!         lenient: missing → warning, startup continues
//!     → request: handler calls ctx.credential()
//!         → CredentialStore::load() (first successful read is cached)
//!         → missing → CredentialError::Unavailable → 503 for that request
//! ```
//!
//! # Design Decisions
//! - The core never interprets the key material; it is opaque bytes
//! - Failed reads are not cached, so a late mount is picked up
//! - The file is read-only and shared by all workers without locking

pub mod store;

pub use store::{secret_available, Credential, CredentialError, CredentialStore};

use std::path::PathBuf;

use crate::config::CredentialsConfig;

/// Result of the startup credential check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preflight {
    /// Credential is mounted and readable.
    Ready,
    /// Credential is missing; requests that need it will fail individually.
    Deferred { path: PathBuf },
}

/// Check the credential before the listener starts.
///
/// With `strict_preflight` a missing credential is returned as an error;
/// otherwise it is logged and deferred to first use.
pub fn preflight(config: &CredentialsConfig) -> Result<Preflight, CredentialError> {
    if secret_available(&config.path) {
        tracing::info!(path = %config.path.display(), "Credential present");
        return Ok(Preflight::Ready);
    }

    if config.strict_preflight {
        tracing::error!(
            path = %config.path.display(),
            "Credential missing and strict preflight is enabled"
        );
        return Err(CredentialError::Unavailable {
            path: config.path.clone(),
        });
    }

    tracing::warn!(
        path = %config.path.display(),
        "Credential missing; handlers that need it will fail until it is mounted"
    );
    Ok(Preflight::Deferred {
        path: config.path.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing_path() -> PathBuf {
        std::env::temp_dir().join(format!("slotd-missing-{}.json", uuid::Uuid::new_v4()))
    }

    #[test]
    fn lenient_preflight_defers_missing_credential() {
        let config = CredentialsConfig {
            path: missing_path(),
            strict_preflight: false,
        };
        assert!(matches!(preflight(&config), Ok(Preflight::Deferred { .. })));
    }

    #[test]
    fn strict_preflight_rejects_missing_credential() {
        let config = CredentialsConfig {
            path: missing_path(),
            strict_preflight: true,
        };
        assert!(matches!(
            preflight(&config),
            Err(CredentialError::Unavailable { .. })
        ));
    }

    #[test]
    fn present_credential_is_ready() {
        let path = missing_path();
        std::fs::write(&path, br#"{"type":"service_account"}"#).unwrap();

        let config = CredentialsConfig {
            path: path.clone(),
            strict_preflight: true,
        };
        assert_eq!(preflight(&config).unwrap(), Preflight::Ready);

        std::fs::remove_file(path).unwrap();
    }
}

//! Lazily loaded, shared credential.

use std::fs::File;
use std::path::{Path, PathBuf};

use axum::body::Bytes;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::OnceCell;

/// Errors surfaced when a handler asks for the credential.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Nothing readable is mounted at the configured path.
    #[error("credential unavailable at {}", .path.display())]
    Unavailable { path: PathBuf },

    /// The file exists but could not be read.
    #[error("failed to read credential at {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The key material is not the JSON shape the caller expected.
    #[error("credential is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Returns true if `path` is a regular file this process can open.
pub fn secret_available(path: &Path) -> bool {
    path.is_file() && File::open(path).is_ok()
}

/// Opaque key material. `Debug` never prints the contents.
#[derive(Clone)]
pub struct Credential {
    bytes: Bytes,
}

impl Credential {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Deserialize the key material as JSON.
    pub fn parse_json<T: DeserializeOwned>(&self) -> Result<T, CredentialError> {
        Ok(serde_json::from_slice(&self.bytes)?)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}

/// Shared, read-only access to the mounted credential.
///
/// The first successful read is cached for the life of the process.
#[derive(Debug)]
pub struct CredentialStore {
    path: PathBuf,
    cached: OnceCell<Credential>,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cached: OnceCell::new(),
        }
    }

    /// Whether the credential is currently mounted (or already loaded).
    pub fn is_available(&self) -> bool {
        self.cached.initialized() || secret_available(&self.path)
    }

    /// Load the credential, reading from disk on first use.
    pub async fn load(&self) -> Result<Credential, CredentialError> {
        self.cached
            .get_or_try_init(|| async {
                match tokio::fs::read(&self.path).await {
                    Ok(bytes) => {
                        tracing::info!(path = %self.path.display(), "Credential loaded");
                        Ok(Credential {
                            bytes: Bytes::from(bytes),
                        })
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        Err(CredentialError::Unavailable {
                            path: self.path.clone(),
                        })
                    }
                    Err(source) => Err(CredentialError::Read {
                        path: self.path.clone(),
                        source,
                    }),
                }
            })
            .await
            .cloned()
    }
}

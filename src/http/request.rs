//! Request handling.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4)
//! - Carry per-request context (slot, credential access, pool view)
//! - Give handlers typed access to query, headers and body
//!
//! # Design Decisions
//! - Request ID assigned at dispatch, before the handler runs
//! - Context is built fresh for every request; nothing is carried over
//!   from an earlier request on the same slot
//! - Body is fully buffered (bounded by `limits.max_body_bytes`)

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::Query;
use axum::http::{request::Parts, HeaderMap, HeaderName, Method, Uri};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use super::handler::HandlerError;
use crate::credentials::{Credential, CredentialStore};
use crate::workers::{PoolStats, SlotId, WorkerPool};

/// Response header carrying the request ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Response header naming the worker slot that served the request.
pub const X_WORKER_SLOT: HeaderName = HeaderName::from_static("x-worker-slot");

/// Unique identifier for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Per-request view of the serving core handed to handlers.
#[derive(Clone)]
pub struct RequestContext {
    request_id: RequestId,
    slot: SlotId,
    credentials: Arc<CredentialStore>,
    pool: WorkerPool,
}

impl RequestContext {
    pub(crate) fn new(
        request_id: RequestId,
        slot: SlotId,
        credentials: Arc<CredentialStore>,
        pool: WorkerPool,
    ) -> Self {
        Self {
            request_id,
            slot,
            credentials,
            pool,
        }
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    pub fn slot(&self) -> SlotId {
        self.slot
    }

    /// Load the mounted credential, failing this request if it is absent.
    pub async fn credential(&self) -> Result<Credential, HandlerError> {
        Ok(self.credentials.load().await?)
    }

    /// Whether the credential is mounted right now.
    pub fn credential_available(&self) -> bool {
        self.credentials.is_available()
    }

    /// Occupancy of the worker pool.
    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.request_id)
            .field("slot", &self.slot)
            .finish_non_exhaustive()
    }
}

/// A fully buffered request as seen by a handler.
#[derive(Debug)]
pub struct AppRequest {
    parts: Parts,
    body: Bytes,
    ctx: RequestContext,
}

impl AppRequest {
    pub fn new(parts: Parts, body: Bytes, ctx: RequestContext) -> Self {
        Self { parts, body, ctx }
    }

    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.parts.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn ctx(&self) -> &RequestContext {
        &self.ctx
    }

    /// Deserialize the query string.
    pub fn query<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        Query::try_from_uri(&self.parts.uri)
            .map(|Query(value)| value)
            .map_err(|e| HandlerError::bad_request(e.body_text()))
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| HandlerError::bad_request(format!("invalid JSON body: {}", e)))
    }
}

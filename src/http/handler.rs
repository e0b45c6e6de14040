//! Handler abstraction.
//!
//! # Responsibilities
//! - Define the seam between the serving core and application code
//! - Classify handler failures into HTTP statuses
//!
//! # Design Decisions
//! - Any `async fn(AppRequest) -> HandlerResult` is a handler
//! - Handlers are boxed once at registration; dispatch is a vtable call
//! - Internal fault messages are logged, never sent to the client

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use super::request::AppRequest;
use super::response::error_response;
use crate::credentials::CredentialError;

/// What a handler returns.
pub type HandlerResult = Result<Response, HandlerError>;

/// Boxed handler future.
pub type HandlerFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send + 'static>>;

/// Type-erased handler stored in the registry.
pub type BoxedHandler = Arc<dyn Handler>;

/// A request handler supplied by the application.
///
/// Handlers run on the shared Tokio runtime, the same threads that drive
/// the accept loop. The request timeout cancels a handler only at an
/// `.await`: code that blocks its thread (synchronous SDK or file I/O, long
/// CPU work) cannot be preempted and stalls that runtime thread until it
/// returns. Move such work to `tokio::task::spawn_blocking`; note that the
/// blocking task itself keeps running after a timeout drops its handle.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, request: AppRequest) -> HandlerFuture;
}

impl<F, Fut> Handler for F
where
    F: Fn(AppRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, request: AppRequest) -> HandlerFuture {
        Box::pin(self(request))
    }
}

/// Failures a handler can report.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The request itself is unusable (bad JSON, missing field, ...).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The mounted credential could not be used.
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// Anything else; reported to the client as a 500.
    #[error("handler fault: {0}")]
    Fault(String),
}

impl HandlerError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        HandlerError::BadRequest(message.into())
    }

    pub fn fault(error: impl std::fmt::Display) -> Self {
        HandlerError::Fault(error.to_string())
    }

    /// HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            HandlerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            HandlerError::Credential(CredentialError::Malformed(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            HandlerError::Credential(_) => StatusCode::SERVICE_UNAVAILABLE,
            HandlerError::Fault(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True if the failure is on the server side.
    pub fn is_fault(&self) -> bool {
        self.status().is_server_error() && self.status() != StatusCode::SERVICE_UNAVAILABLE
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            HandlerError::BadRequest(_) => self.to_string(),
            HandlerError::Credential(CredentialError::Malformed(_)) => {
                "internal server error".to_string()
            }
            HandlerError::Credential(_) => "credential unavailable".to_string(),
            HandlerError::Fault(_) => "internal server error".to_string(),
        };
        error_response(status, &message)
    }
}

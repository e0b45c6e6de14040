//! Response construction and request outcomes.
//!
//! # Responsibilities
//! - Build the core's own error responses (404, 405, 413, 500, 504)
//! - Classify how each request ended for logs and metrics
//!
//! # Design Decisions
//! - Error bodies are small JSON objects: `{"error": "..."}`
//! - Every response closes the connection (one request per slot cycle)
//! - Timed-out requests return 504 Gateway Timeout

use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

/// JSON error body with the given status.
pub fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

pub fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "not found")
}

/// 405 with an `Allow` header listing the registered methods.
pub fn method_not_allowed(allowed: &[Method]) -> Response {
    let mut response = error_response(StatusCode::METHOD_NOT_ALLOWED, "method not allowed");
    let allow = allowed
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if let Ok(value) = HeaderValue::from_str(&allow) {
        response.headers_mut().insert(header::ALLOW, value);
    }
    response
}

pub fn payload_too_large(limit: usize) -> Response {
    error_response(
        StatusCode::PAYLOAD_TOO_LARGE,
        &format!("request body exceeds {} bytes", limit),
    )
}

pub fn bad_request(message: &str) -> Response {
    error_response(StatusCode::BAD_REQUEST, message)
}

pub fn internal_error() -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
}

pub fn timeout() -> Response {
    error_response(StatusCode::GATEWAY_TIMEOUT, "request timed out")
}

/// How a dispatched request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Handler returned a response.
    Completed,
    /// No route for the path.
    NotFound,
    /// Route exists, method does not.
    MethodNotAllowed,
    /// Request rejected before or by the handler (400, 413, handler 4xx).
    Rejected,
    /// Handler needed the credential and it was not mounted.
    CredentialUnavailable,
    /// Deadline elapsed; handler future dropped.
    TimedOut,
    /// Handler error or panic.
    Faulted,
}

/// Terminal state of the per-request state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    Completed,
    TimedOut,
    Faulted,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Completed => "completed",
            Outcome::NotFound => "not_found",
            Outcome::MethodNotAllowed => "method_not_allowed",
            Outcome::Rejected => "rejected",
            Outcome::CredentialUnavailable => "credential_unavailable",
            Outcome::TimedOut => "timed_out",
            Outcome::Faulted => "faulted",
        }
    }

    pub fn terminal(&self) -> Terminal {
        match self {
            Outcome::TimedOut => Terminal::TimedOut,
            Outcome::Faulted => Terminal::Faulted,
            _ => Terminal::Completed,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Per-request dispatch.
//!
//! # Request State Machine
//! ```text
//! Accepted → Dispatched → Completed  ┐
//!                       → TimedOut   ├→ SlotFreed
//!                       → Faulted    ┘
//! ```
//!
//! # Responsibilities
//! - Assign the request ID and build the handler context
//! - Look up the handler; answer 404/405 directly
//! - Read the body (bounded), run the handler under the request deadline
//! - Convert errors, panics and timeouts into responses
//! - Emit the access log event and request metrics

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Request};
use axum::response::{IntoResponse, Response};
use futures_util::FutureExt;
use hyper::body::Incoming;
use tracing::Level;

use super::handler::HandlerError;
use super::request::{AppRequest, RequestContext, RequestId, X_REQUEST_ID, X_WORKER_SLOT};
use super::response::{self, Outcome};
use super::server::AppState;
use crate::net::ConnectionInfo;
use crate::observability::logging::ACCESS_TARGET;
use crate::observability::metrics;
use crate::resilience::Deadline;
use crate::routing::RouteMatch;

/// Serve one request on the connection's slot. Always yields a response.
pub(crate) async fn dispatch(state: &AppState, conn: ConnectionInfo, req: Request<Incoming>) -> Response {
    let request_id = RequestId::new();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let deadline = Deadline::start(state.config.request_timeout());

    tracing::debug!(
        request_id = %request_id,
        connection = %conn.id,
        slot = %conn.slot,
        method = %method,
        path = %path,
        "Dispatched"
    );

    let ctx = RequestContext::new(
        request_id,
        conn.slot,
        Arc::clone(&state.credentials),
        state.pool.clone(),
    );

    let (outcome, mut response) = match deadline.run(execute(state, ctx, req)).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                slot = %conn.slot,
                method = %method,
                path = %path,
                timeout_ms = e.limit.as_millis() as u64,
                "Handler timed out; slot recycled"
            );
            (Outcome::TimedOut, response::timeout())
        }
    };

    stamp_headers(response.headers_mut(), request_id, conn);

    let latency = deadline.elapsed();
    let status = response.status().as_u16();

    tracing::info!(
        target: ACCESS_TARGET,
        request_id = %request_id,
        peer = %conn.peer,
        slot = conn.slot.index(),
        method = %method,
        path = %path,
        status,
        duration_ms = latency.as_secs_f64() * 1000.0,
        outcome = %outcome,
        terminal = ?outcome.terminal(),
        "request"
    );
    metrics::record_request(&method, status, outcome, latency);

    response
}

async fn execute(state: &AppState, ctx: RequestContext, req: Request<Incoming>) -> (Outcome, Response) {
    let handler = match state.registry.lookup(req.method(), req.uri().path()) {
        RouteMatch::Matched { handler, .. } => Arc::clone(handler),
        RouteMatch::NotFound => return (Outcome::NotFound, response::not_found()),
        RouteMatch::MethodNotAllowed { allowed } => {
            return (Outcome::MethodNotAllowed, response::method_not_allowed(&allowed))
        }
    };

    let limit = state.config.limits.max_body_bytes;
    if declared_length(req.headers()).is_some_and(|len| len > limit as u64) {
        return (Outcome::Rejected, response::payload_too_large(limit));
    }

    let (parts, body) = req.into_parts();
    let body = match axum::body::to_bytes(Body::new(body), limit).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(request_id = %ctx.request_id(), error = %e, "Failed to read request body");
            return (Outcome::Rejected, response::bad_request("failed to read request body"));
        }
    };

    let request_id = ctx.request_id();
    let request = AppRequest::new(parts, body, ctx);

    match AssertUnwindSafe(handler.call(request)).catch_unwind().await {
        Ok(Ok(response)) => (Outcome::Completed, response),
        Ok(Err(err)) => {
            let outcome = classify(&err);
            let level = severity(outcome);
            if level == Level::ERROR {
                tracing::error!(request_id = %request_id, error = %err, "Handler fault");
            } else if level == Level::WARN {
                tracing::warn!(request_id = %request_id, error = %err, "Credential unavailable");
            } else {
                tracing::debug!(request_id = %request_id, error = %err, "Handler rejected request");
            }
            (outcome, err.into_response())
        }
        Err(panic) => {
            tracing::error!(
                request_id = %request_id,
                panic = %panic_message(panic.as_ref()),
                "Handler panicked"
            );
            (Outcome::Faulted, response::internal_error())
        }
    }
}

fn classify(err: &HandlerError) -> Outcome {
    match err {
        HandlerError::Credential(_) if !err.is_fault() => Outcome::CredentialUnavailable,
        _ if err.is_fault() => Outcome::Faulted,
        _ => Outcome::Rejected,
    }
}

/// Level for a handler error on the diagnostic stream. A missing credential
/// is an operator problem, so it must show at the default level.
fn severity(outcome: Outcome) -> Level {
    match outcome {
        Outcome::Faulted => Level::ERROR,
        Outcome::CredentialUnavailable => Level::WARN,
        _ => Level::DEBUG,
    }
}

fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

fn stamp_headers(headers: &mut HeaderMap, request_id: RequestId, conn: ConnectionInfo) {
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        headers.insert(X_REQUEST_ID, value);
    }
    headers.insert(X_WORKER_SLOT, HeaderValue::from(conn.slot.index()));
    headers.insert(header::CONNECTION, HeaderValue::from_static("close"));
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

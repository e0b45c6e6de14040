//! Diagnostics application.
//!
//! Small set of routes for smoke testing a deployment: who served the
//! request, whether the credential is usable, body round trip, and a
//! controllable slow path for exercising the request timeout.

use std::time::Duration;

use axum::http::{header, HeaderValue};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::http::{AppRequest, HandlerResult};
use crate::routing::HandlerRegistry;

pub const NAME: &str = "diagnostics";

pub fn registry() -> HandlerRegistry {
    HandlerRegistry::new()
        .get("/", index)
        .get("/credential", credential)
        .post("/echo", echo)
        .get("/sleep", sleep)
}

async fn index(req: AppRequest) -> HandlerResult {
    let ctx = req.ctx();
    Ok(Json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "slot": ctx.slot().index(),
        "request_id": ctx.request_id().to_string(),
    }))
    .into_response())
}

/// Reports the credential's size and top-level field names. Values are
/// never echoed.
async fn credential(req: AppRequest) -> HandlerResult {
    let credential = req.ctx().credential().await?;
    let fields: Vec<String> = credential
        .parse_json::<Map<String, Value>>()?
        .keys()
        .cloned()
        .collect();

    Ok(Json(json!({
        "available": true,
        "bytes": credential.len(),
        "fields": fields,
    }))
    .into_response())
}

async fn echo(req: AppRequest) -> HandlerResult {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or(HeaderValue::from_static("application/octet-stream"));
    Ok(([(header::CONTENT_TYPE, content_type)], req.body().clone()).into_response())
}

#[derive(Debug, Deserialize)]
struct SleepParams {
    ms: u64,
}

async fn sleep(req: AppRequest) -> HandlerResult {
    let params: SleepParams = req.query()?;
    tokio::time::sleep(Duration::from_millis(params.ms)).await;
    Ok(Json(json!({ "slept_ms": params.ms })).into_response())
}

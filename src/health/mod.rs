//! Built-in health endpoint.
//!
//! Liveness probe for the platform: answers 200 whenever the process can
//! serve a request, and reports pool occupancy and credential presence so
//! an operator can see why requests might be failing.
//!
//! # Design Decisions
//! - Served through the normal registry, so it takes a worker slot like any
//!   other request; a health check that succeeds proves a slot was free
//! - A missing credential is reported, not failed: lenient mode keeps
//!   serving routes that do not need it

use axum::Json;
use axum::response::IntoResponse;
use serde::Serialize;

use crate::http::{AppRequest, HandlerResult};
use crate::workers::PoolStats;

/// Body of the health response.
#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    #[serde(flatten)]
    pub pool: PoolStats,
    pub credential: &'static str,
}

impl HealthReport {
    pub fn new(pool: PoolStats, credential_available: bool) -> Self {
        Self {
            status: "ok",
            pool,
            credential: if credential_available { "present" } else { "missing" },
        }
    }
}

/// Health check handler.
pub async fn health(req: AppRequest) -> HandlerResult {
    let ctx = req.ctx();
    let report = HealthReport::new(ctx.pool_stats(), ctx.credential_available());
    Ok(Json(report).into_response())
}

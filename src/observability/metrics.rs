//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define serving metrics (requests, latency, slot occupancy)
//! - Expose a Prometheus-compatible scrape endpoint when enabled
//!
//! # Metrics
//! - `slotd_requests_total` (counter): requests by method, status, outcome
//! - `slotd_request_duration_seconds` (histogram): latency by outcome
//! - `slotd_busy_slots` (gauge): worker slots currently held
//!
//! # Design Decisions
//! - Without an installed recorder every call is a no-op
//! - Scrape endpoint runs on its own address, outside the worker pool

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::Method;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::http::response::Outcome;

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one finished request.
pub fn record_request(method: &Method, status: u16, outcome: Outcome, latency: Duration) {
    metrics::counter!(
        "slotd_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "outcome" => outcome.as_str(),
    )
    .increment(1);

    metrics::histogram!(
        "slotd_request_duration_seconds",
        "outcome" => outcome.as_str(),
    )
    .record(latency.as_secs_f64());
}

/// Record current slot occupancy.
pub fn record_busy_slots(busy: usize) {
    metrics::gauge!("slotd_busy_slots").set(busy as f64);
}

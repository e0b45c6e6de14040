//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatch produces, per request:
//!     → logging.rs access event (target slotd::access) → stdout
//!     → metrics.rs counters + latency histogram
//!
//! Everything else (startup, timeouts, faults, shutdown):
//!     → logging.rs diagnostic events → stderr
//! ```
//!
//! # Design Decisions
//! - Structured fields on every event (method, path, status, slot, ...)
//! - Request ID flows into logs and the X-Request-Id response header
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;

//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Connection accepted:
//!     → timeouts.rs (connection deadline: 2 × request timeout)
//!     → request dispatched
//!         → timeouts.rs (request deadline: body read + handler)
//!         → expiry: future dropped, 504 written, slot released
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every request has a deadline
//! - No retries: retry policy belongs to clients and to handlers' own
//!   downstream calls

pub mod timeouts;

pub use timeouts::{Deadline, DeadlineExceeded};

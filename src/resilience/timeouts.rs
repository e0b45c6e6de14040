//! Timeout enforcement.
//!
//! # Responsibilities
//! - Bound each request (body read + handler) by the request timeout
//! - Bound each connection by a hard deadline
//! - Cancel operations cleanly on timeout
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; expiry drops the inner future
//! - Timeout errors are distinct from other errors
//! - Timed-out requests return 504 Gateway Timeout

use std::future::Future;
use std::time::{Duration, Instant};

use thiserror::Error;

/// The deadline passed before the operation finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("deadline of {}ms exceeded", .limit.as_millis())]
pub struct DeadlineExceeded {
    pub limit: Duration,
}

/// A time budget that starts when it is created.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    limit: Duration,
}

impl Deadline {
    pub fn start(limit: Duration) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Budget left; zero once expired.
    pub fn remaining(&self) -> Duration {
        self.limit.saturating_sub(self.elapsed())
    }

    /// Run `fut` within the remaining budget. On expiry the future is
    /// dropped, which cancels it at its current await point.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, DeadlineExceeded> {
        tokio::time::timeout(self.remaining(), fut)
            .await
            .map_err(|_| DeadlineExceeded { limit: self.limit })
    }
}

//! Worker pool subsystem.
//!
//! # Data Flow
//! ```text
//! accept loop
//!     → pool.rs: acquire() waits for a free permit + slot index
//!     → listener accepts; SlotGuard::activate() marks the slot busy
//!     → SlotGuard moves into the connection task
//!     → request served (Completed | TimedOut | Faulted)
//!     → task ends, SlotGuard dropped → slot.rs returns index, permit freed
//! ```
//!
//! # Design Decisions
//! - Parallelism is fixed at startup, never elastic
//! - Each slot serves one request at a time
//! - Release is tied to `Drop`, so timeouts, faults and panics all free
//!   the slot

pub mod pool;
pub mod slot;

pub use pool::{PoolError, PoolStats, WorkerPool};
pub use slot::{SlotGuard, SlotId};

//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Worker slot acquired
//!     → listener.rs (accept one connection from the backlog)
//!     → connection.rs (assign id, record peer + slot)
//!     → Hand off to HTTP layer
//!
//! Connection States:
//!     Backlogged → Accepted → Served → Closed
//! ```
//!
//! # Design Decisions
//! - Wildcard bind only; the platform picks the port
//! - The kernel backlog is the only queue for excess connections
//! - No TLS; the platform edge terminates it

pub mod connection;
pub mod listener;

pub use connection::{ConnectionId, ConnectionInfo};
pub use listener::{BindError, Listener};

//! Connection identity for tracing.
//!
//! # Responsibilities
//! - Generate unique connection IDs
//! - Record which peer and worker slot a connection belongs to
//!
//! # Design Decisions
//! - One connection carries exactly one request (keep-alive disabled), so
//!   the connection lifetime and the slot hold coincide

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::workers::SlotId;

/// Global atomic counter for connection IDs.
/// Relaxed ordering is enough: only uniqueness matters.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn next() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Who is connected, and on which slot.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionInfo {
    pub id: ConnectionId,
    pub peer: SocketAddr,
    pub slot: SlotId,
    pub accepted_at: Instant,
}

impl ConnectionInfo {
    pub fn new(peer: SocketAddr, slot: SlotId) -> Self {
        Self {
            id: ConnectionId::next(),
            peer,
            slot,
            accepted_at: Instant::now(),
        }
    }
}

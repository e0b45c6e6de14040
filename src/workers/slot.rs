//! Worker slot bookkeeping.
//!
//! # Responsibilities
//! - Identify each worker slot (stable index into the pool arena)
//! - Track whether the slot is serving and how many requests it has served
//! - Release the slot on every exit path via [`SlotGuard`]'s `Drop`

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::OwnedSemaphorePermit;

use super::pool::PoolInner;

/// Index of a worker slot within its pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(usize);

impl SlotId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Position of the slot in the arena.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "slot-{}", self.0)
    }
}

/// One execution context in the pool. Holds counters only; no request data
/// survives on a slot between requests.
#[derive(Debug)]
pub(crate) struct WorkerSlot {
    busy: AtomicBool,
    served: AtomicU64,
}

impl WorkerSlot {
    pub(crate) fn new() -> Self {
        Self {
            busy: AtomicBool::new(false),
            served: AtomicU64::new(0),
        }
    }

    pub(crate) fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Number of connections this slot has served to completion.
    pub(crate) fn served(&self) -> u64 {
        self.served.load(Ordering::Relaxed)
    }

    pub(crate) fn mark_busy(&self) {
        self.busy.store(true, Ordering::SeqCst);
    }

    /// Returns whether the slot had been serving; only those count as served.
    pub(crate) fn mark_free(&self) -> bool {
        let was_busy = self.busy.swap(false, Ordering::SeqCst);
        if was_busy {
            self.served.fetch_add(1, Ordering::Relaxed);
        }
        was_busy
    }
}

/// Exclusive hold on one worker slot.
///
/// A fresh guard only reserves the slot; it counts as busy once
/// [`activate`](SlotGuard::activate) is called for an accepted connection.
///
/// When dropped, the slot index goes back on the free list and only then is
/// the semaphore permit released, so a newly admitted connection always finds
/// a free index.
#[derive(Debug)]
pub struct SlotGuard {
    id: SlotId,
    active: bool,
    pool: Arc<PoolInner>,
    _permit: OwnedSemaphorePermit,
}

impl SlotGuard {
    pub(crate) fn new(id: SlotId, pool: Arc<PoolInner>, permit: OwnedSemaphorePermit) -> Self {
        Self {
            id,
            active: false,
            pool,
            _permit: permit,
        }
    }

    /// Mark the slot as serving. Idempotent.
    pub fn activate(&mut self) {
        if !self.active {
            self.active = true;
            self.pool.activate(self.id);
        }
    }

    /// The slot this guard holds.
    pub fn id(&self) -> SlotId {
        self.id
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.pool.release(self.id);
        tracing::trace!(slot = %self.id, "Slot freed");
    }
}

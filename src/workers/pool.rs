//! Fixed-size worker slot pool.
//!
//! # Responsibilities
//! - Own the arena of `WorkerSlot`s, indexed by `SlotId`
//! - Admit at most `count` concurrent holders (semaphore permits)
//! - Hand out a free slot index with each permit
//! - Report occupancy for health checks and metrics
//!
//! # Design Decisions
//! - The accept loop acquires a slot *before* accepting, so excess
//!   connections queue in the kernel backlog instead of in this process
//! - Permits and free indices move together: a permit is only released
//!   after its index has been returned

use std::sync::{Arc, Mutex};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::Semaphore;

use super::slot::{SlotGuard, SlotId, WorkerSlot};
use crate::observability::metrics;

/// Errors from slot acquisition.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    /// The pool has been closed for shutdown.
    #[error("worker pool is closed")]
    Closed,

    /// A permit was granted but no slot index was free. Indicates a
    /// bookkeeping bug; the permit is returned immediately.
    #[error("no free worker slot despite an available permit")]
    Inconsistent,
}

/// Point-in-time occupancy of the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub workers: usize,
    pub busy: usize,
    pub idle: usize,
    pub served: u64,
}

#[derive(Debug)]
pub(crate) struct PoolInner {
    slots: Box<[WorkerSlot]>,
    free: Mutex<Vec<SlotId>>,
}

impl PoolInner {
    pub(crate) fn activate(&self, id: SlotId) {
        if let Some(slot) = self.slots.get(id.index()) {
            slot.mark_busy();
        }
        metrics::record_busy_slots(self.busy());
    }

    pub(crate) fn release(&self, id: SlotId) {
        let was_busy = self
            .slots
            .get(id.index())
            .is_some_and(|slot| slot.mark_free());
        {
            let mut free = self.free.lock().unwrap_or_else(|e| e.into_inner());
            free.push(id);
        }
        if was_busy {
            metrics::record_busy_slots(self.busy());
        }
    }

    fn busy(&self) -> usize {
        self.slots.iter().filter(|s| s.is_busy()).count()
    }

    fn take(&self) -> Option<SlotId> {
        let mut free = self.free.lock().unwrap_or_else(|e| e.into_inner());
        free.pop()
    }
}

/// Pool of worker slots shared by the accept loop and the health endpoint.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    inner: Arc<PoolInner>,
    permits: Arc<Semaphore>,
}

impl WorkerPool {
    /// Create a pool with `count` slots. `count` must be at least 1
    /// (enforced by config validation).
    pub fn new(count: usize) -> Self {
        let slots: Box<[WorkerSlot]> = (0..count).map(|_| WorkerSlot::new()).collect();
        // Reversed so that `pop` hands out slot-0 first.
        let free = (0..count).rev().map(SlotId::new).collect();

        Self {
            inner: Arc::new(PoolInner {
                slots,
                free: Mutex::new(free),
            }),
            permits: Arc::new(Semaphore::new(count)),
        }
    }

    /// Wait for a free slot.
    pub async fn acquire(&self) -> Result<SlotGuard, PoolError> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| PoolError::Closed)?;
        self.claim(permit)
    }

    /// Reserve a slot index for `permit`. The slot stays idle until the
    /// guard is activated.
    fn claim(&self, permit: tokio::sync::OwnedSemaphorePermit) -> Result<SlotGuard, PoolError> {
        let id = self.inner.take().ok_or(PoolError::Inconsistent)?;
        Ok(SlotGuard::new(id, Arc::clone(&self.inner), permit))
    }

    /// Refuse all further acquisitions.
    pub fn close(&self) {
        self.permits.close();
    }

    pub fn capacity(&self) -> usize {
        self.inner.slots.len()
    }

    /// Slots currently serving a connection. Reserved but not yet
    /// activated slots are not counted.
    pub fn busy(&self) -> usize {
        self.inner.busy()
    }

    pub fn stats(&self) -> PoolStats {
        let busy = self.busy();
        PoolStats {
            workers: self.capacity(),
            busy,
            idle: self.capacity() - busy,
            served: self.inner.slots.iter().map(|s| s.served()).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn is_saturated(pool: &WorkerPool) -> bool {
        tokio::time::timeout(Duration::from_millis(20), pool.acquire())
            .await
            .is_err()
    }

    #[tokio::test]
    async fn hands_out_distinct_slots() {
        let pool = WorkerPool::new(2);

        let mut a = pool.acquire().await.unwrap();
        let mut b = pool.acquire().await.unwrap();
        a.activate();
        b.activate();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id(), SlotId::new(0));
        assert_eq!(pool.stats().busy, 2);
        assert!(is_saturated(&pool).await);

        drop(a);
        assert_eq!(pool.stats().busy, 1);
        let mut c = pool.acquire().await.unwrap();
        c.activate();
        assert_eq!(c.id(), SlotId::new(0));

        drop(b);
        drop(c);
        let stats = pool.stats();
        assert_eq!(stats.busy, 0);
        assert_eq!(stats.idle, 2);
        assert_eq!(stats.served, 3);
    }

    #[tokio::test]
    async fn reserved_slot_is_not_busy() {
        let pool = WorkerPool::new(2);

        let mut reserved = pool.acquire().await.unwrap();
        assert_eq!(pool.stats().busy, 0);
        assert_eq!(pool.stats().idle, 2);

        reserved.activate();
        reserved.activate();
        assert_eq!(pool.stats().busy, 1);

        drop(reserved);
        let unused = pool.acquire().await.unwrap();
        drop(unused);
        let stats = pool.stats();
        assert_eq!(stats.busy, 0);
        assert_eq!(stats.served, 1);
    }

    #[tokio::test]
    async fn waiter_is_admitted_when_slot_frees() {
        let pool = WorkerPool::new(1);
        let held = pool.acquire().await.unwrap();

        let waiter = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.acquire().await.map(|g| g.id()) })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(held);
        let id = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(id, SlotId::new(0));
    }

    #[tokio::test]
    async fn slot_released_when_task_panics() {
        let pool = WorkerPool::new(1);
        let mut guard = pool.acquire().await.unwrap();
        guard.activate();

        let result = tokio::spawn(async move {
            let _guard = guard;
            panic!("handler blew up");
        })
        .await;
        assert!(result.is_err());

        assert_eq!(pool.stats().busy, 0);
        assert!(!is_saturated(&pool).await);
    }

    #[tokio::test]
    async fn closed_pool_refuses_acquire() {
        let pool = WorkerPool::new(1);
        pool.close();
        assert_eq!(pool.acquire().await.unwrap_err(), PoolError::Closed);
    }
}

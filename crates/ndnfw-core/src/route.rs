use core::sync::atomic::Ordering;
use std::sync::RwLock;

use crossbeam_epoch::{self as epoch, Atomic, Owned};
use ndnfw_dsa::{Name, RankingSnapshot, RankingTable};

/// A FIB entry: one name prefix and the ranking of its next hops.
///
/// ## Shadow-Swap
/// Writers mutate the table under a write lock and, before releasing it,
/// publish a fresh immutable snapshot through an epoch-managed atomic pointer.
/// Readers load the snapshot without touching the lock, so forwarding
/// decisions never wait on telemetry updates and always see a whole ranking.
pub struct RouteEntry {
    prefix: Name,
    table: RwLock<RankingTable>,
    published: Atomic<RankingSnapshot>,
}

impl RouteEntry {
    pub fn new(prefix: Name) -> Self {
        Self {
            prefix,
            table: RwLock::new(RankingTable::new()),
            published: Atomic::new(RankingSnapshot::default()),
        }
    }

    pub fn prefix(&self) -> &Name {
        &self.prefix
    }

    /// Current forwarding order. Lock-free.
    pub fn snapshot(&self) -> RankingSnapshot {
        let guard = epoch::pin();
        // # Safety: Acquire pairs with the Release half of the swap in
        // `update`, so the snapshot is fully initialized. The guard keeps the
        // pointee alive until we have cloned the inner Arc out of it.
        let shared = self.published.load(Ordering::Acquire, &guard);
        unsafe { shared.as_ref() }.cloned().unwrap_or_default()
    }

    /// Mutates the ranking and republishes the snapshot atomically with
    /// respect to readers.
    pub fn update<R>(&self, f: impl FnOnce(&mut RankingTable) -> R) -> R {
        let mut table = self.table.write().unwrap_or_else(|e| e.into_inner());
        let out = f(&mut table);

        let guard = epoch::pin();
        let old = self
            .published
            .swap(Owned::new(table.snapshot()), Ordering::AcqRel, &guard);
        // # Safety: `old` is unreachable for new readers after the swap;
        // destruction is deferred until every pinned reader has moved on.
        unsafe {
            if !old.is_null() {
                guard.defer_destroy(old);
            }
        }
        out
    }

    /// Reads the live table (e.g. the secondary orders not in the snapshot).
    pub fn read<R>(&self, f: impl FnOnce(&RankingTable) -> R) -> R {
        let table = self.table.read().unwrap_or_else(|e| e.into_inner());
        f(&table)
    }

    pub fn len(&self) -> usize {
        self.read(|t| t.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for RouteEntry {
    fn drop(&mut self) {
        let guard = epoch::pin();
        let old = self
            .published
            .swap(epoch::Shared::null(), Ordering::AcqRel, &guard);
        // # Safety: same deferred reclamation as `update`.
        unsafe {
            if !old.is_null() {
                guard.defer_destroy(old);
            }
        }
    }
}

static_assertions::assert_impl_all!(RouteEntry: Send, Sync);

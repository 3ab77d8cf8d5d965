/*!
 * Lock-Free Guard Statistics
 * Atomic counters shared by any number of guarded callbacks
 */

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic callback statistics for lock-free updates
///
/// # Performance
/// - Cache-line aligned to prevent false sharing
/// - All operations use relaxed ordering
#[repr(C, align(64))]
#[derive(Debug, Default)]
pub struct GuardStats {
    wrapped: AtomicU64,
    invoked: AtomicU64,
    deferred: AtomicU64,
    ignored: AtomicU64,
    timed_out: AtomicU64,
    disposed: AtomicU64,
}

/// Point-in-time copy of [`GuardStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardStatsSnapshot {
    pub wrapped: u64,
    pub invoked: u64,
    pub deferred: u64,
    pub ignored: u64,
    pub timed_out: u64,
    pub disposed: u64,
}

impl GuardStats {
    #[inline]
    pub const fn new() -> Self {
        Self {
            wrapped: AtomicU64::new(0),
            invoked: AtomicU64::new(0),
            deferred: AtomicU64::new(0),
            ignored: AtomicU64::new(0),
            timed_out: AtomicU64::new(0),
            disposed: AtomicU64::new(0),
        }
    }

    #[inline(always)]
    pub fn inc_wrapped(&self) {
        self.wrapped.fetch_add(1, Ordering::Relaxed);
    }

    /// Callback body actually ran
    #[inline(always)]
    pub fn inc_invoked(&self) {
        self.invoked.fetch_add(1, Ordering::Relaxed);
    }

    /// First call arrived before the boundary and was parked
    #[inline(always)]
    pub fn inc_deferred(&self) {
        self.deferred.fetch_add(1, Ordering::Relaxed);
    }

    /// Redundant call dropped by the latch
    #[inline(always)]
    pub fn inc_ignored(&self) {
        self.ignored.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_timed_out(&self) {
        self.timed_out.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_disposed(&self) {
        self.disposed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of current stats (no locks required)
    ///
    /// # Note
    /// Values may not be perfectly consistent with each other due to concurrent updates,
    /// but each individual value is accurate.
    #[inline]
    pub fn snapshot(&self) -> GuardStatsSnapshot {
        GuardStatsSnapshot {
            wrapped: self.wrapped.load(Ordering::Relaxed),
            invoked: self.invoked.load(Ordering::Relaxed),
            deferred: self.deferred.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            disposed: self.disposed.load(Ordering::Relaxed),
        }
    }
}

impl GuardStatsSnapshot {
    /// Wrappers that reached a terminal state
    pub fn settled(&self) -> u64 {
        self.invoked + self.timed_out + self.disposed
    }
}

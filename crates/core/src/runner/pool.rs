//! Slot accounting shared between the dispatcher and running tasks.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crate::metrics;

use super::types::{JobStatus, PoolStatus};

/// Tracks statistics for the process pool.
///
/// Updated only around semaphore permits, so `active` never exceeds the
/// number of permits.
#[derive(Debug, Default)]
pub(crate) struct PoolStats {
    active: AtomicUsize,
    peak: AtomicUsize,
    queued: AtomicUsize,
    total_processed: AtomicU64,
    total_failed: AtomicU64,
}

impl PoolStats {
    pub(crate) fn with_queued(queued: usize) -> Self {
        let stats = Self::default();
        stats.queued.store(queued, Ordering::SeqCst);
        stats
    }

    /// A task left the queue without running.
    pub(crate) fn dequeue(&self) {
        self.queued.fetch_sub(1, Ordering::SeqCst);
    }

    /// A task took a slot.
    pub(crate) fn start_job(&self) {
        self.queued.fetch_sub(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        metrics::ACTIVE_PROCESSES.inc();
    }

    /// A task released its slot.
    pub(crate) fn finish_job(&self, status: JobStatus) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.total_processed.fetch_add(1, Ordering::SeqCst);
        if status == JobStatus::Failed {
            self.total_failed.fetch_add(1, Ordering::SeqCst);
        }
        metrics::ACTIVE_PROCESSES.dec();
    }

    pub(crate) fn to_status(&self, max_concurrent: usize) -> PoolStatus {
        PoolStatus {
            active_jobs: self.active.load(Ordering::SeqCst),
            peak_active_jobs: self.peak.load(Ordering::SeqCst),
            max_concurrent,
            queued_jobs: self.queued.load(Ordering::SeqCst),
            total_processed: self.total_processed.load(Ordering::SeqCst),
            total_failed: self.total_failed.load(Ordering::SeqCst),
        }
    }
}

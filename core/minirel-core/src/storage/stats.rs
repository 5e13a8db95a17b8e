//! Per-query I/O counters.
//!
//! One `IoStats` is created per query execution context and shared (via
//! `Arc`) by every reader/writer that query opens, so two queries never
//! contaminate each other's numbers.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Page and run-file counters for one query.
#[derive(Debug, Default)]
pub struct IoStats {
    pages_read: AtomicU64,
    pages_written: AtomicU64,
    runs_created: AtomicU64,
    runs_deleted: AtomicU64,
}

/// Point-in-time copy of [`IoStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct IoSnapshot {
    pub pages_read: u64,
    pub pages_written: u64,
    pub runs_created: u64,
    pub runs_deleted: u64,
}

impl IoStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_page_read(&self) {
        self.pages_read.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_page_written(&self) {
        self.pages_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_run_created(&self) {
        self.runs_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_run_deleted(&self) {
        self.runs_deleted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> IoSnapshot {
        IoSnapshot {
            pages_read: self.pages_read.load(Ordering::Relaxed),
            pages_written: self.pages_written.load(Ordering::Relaxed),
            runs_created: self.runs_created.load(Ordering::Relaxed),
            runs_deleted: self.runs_deleted.load(Ordering::Relaxed),
        }
    }
}

impl IoSnapshot {
    /// Runs created but not yet deleted.
    pub fn live_runs(&self) -> u64 {
        self.runs_created.saturating_sub(self.runs_deleted)
    }
}

//! Execution context — configuration and I/O counters for one query.

use crate::config::ExecConfig;
use crate::storage::{IoSnapshot, IoStats};
use std::sync::Arc;

/// Threaded through operator construction instead of global state, so
/// concurrent queries (and tests) keep separate counters.
#[derive(Debug, Clone, Default)]
pub struct ExecContext {
    config: ExecConfig,
    stats: Arc<IoStats>,
}

impl ExecContext {
    pub fn new(config: ExecConfig) -> Self {
        Self {
            config,
            stats: Arc::new(IoStats::new()),
        }
    }

    pub fn config(&self) -> &ExecConfig {
        &self.config
    }

    /// Shared handle to this query's counters.
    pub fn stats(&self) -> Arc<IoStats> {
        Arc::clone(&self.stats)
    }

    pub fn io_snapshot(&self) -> IoSnapshot {
        self.stats.snapshot()
    }
}

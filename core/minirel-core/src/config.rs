//! Execution configuration — join/sort algorithm choice and page budgets.
//!
//! # Example
//!
//! ```rust
//! use minirel_core::config::{ExecConfig, JoinMethod, SortMethod};
//!
//! let config = ExecConfig::default()
//!     .with_join(JoinMethod::BlockNestedLoop { buffer_pages: 5 })
//!     .with_sort(SortMethod::External { buffer_pages: 4 });
//! assert!(config.validate().is_ok());
//! ```

use crate::error::{MinirelError, MinirelResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Join algorithm used when realizing every join of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JoinMethod {
    /// Rescan the inner relation once per outer tuple.
    TupleNestedLoop,
    /// Rescan the inner relation once per block of `buffer_pages` outer pages.
    BlockNestedLoop { buffer_pages: usize },
    /// Sort both inputs on the equi-join keys and merge.
    SortMerge,
}

impl Default for JoinMethod {
    fn default() -> Self {
        JoinMethod::BlockNestedLoop { buffer_pages: 5 }
    }
}

/// Sort algorithm used for ORDER BY, DISTINCT and sort-merge inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SortMethod {
    /// Buffer the whole input in memory.
    InMemory,
    /// Bounded-memory multi-pass merge sort.
    External { buffer_pages: usize },
}

impl Default for SortMethod {
    fn default() -> Self {
        SortMethod::External { buffer_pages: 5 }
    }
}

/// Per-query execution settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecConfig {
    pub join: JoinMethod,
    pub sort: SortMethod,
    /// Allow the optimizer to pick index scans when cheaper than a full scan.
    pub use_indexes: bool,
    /// Directory for external-sort runs; the system temp dir when `None`.
    pub temp_dir: Option<PathBuf>,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            join: JoinMethod::default(),
            sort: SortMethod::default(),
            use_indexes: true,
            temp_dir: None,
        }
    }
}

impl ExecConfig {
    pub fn with_join(mut self, join: JoinMethod) -> Self {
        self.join = join;
        self
    }

    pub fn with_sort(mut self, sort: SortMethod) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_indexes(mut self, use_indexes: bool) -> Self {
        self.use_indexes = use_indexes;
        self
    }

    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Directory that sort runs are created in.
    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Reject budgets the algorithms cannot run with.
    pub fn validate(&self) -> MinirelResult<()> {
        if let JoinMethod::BlockNestedLoop { buffer_pages } = self.join {
            if buffer_pages < 1 {
                return Err(MinirelError::InvalidBufferSize {
                    operator: "block nested loop join",
                    minimum: 1,
                    actual: buffer_pages,
                });
            }
        }
        if let SortMethod::External { buffer_pages } = self.sort {
            if buffer_pages < 3 {
                return Err(MinirelError::InvalidBufferSize {
                    operator: "external sort",
                    minimum: 3,
                    actual: buffer_pages,
                });
            }
        }
        Ok(())
    }

    /// Parse a JSON document; missing fields fall back to defaults.
    pub fn from_json(json: &str) -> MinirelResult<Self> {
        let config: ExecConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

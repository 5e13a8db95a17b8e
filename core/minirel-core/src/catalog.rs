//! Catalog — table files, schemas, statistics and index definitions
//!
//! Persisted as a JSON document. Relative file paths are resolved against
//! the directory the catalog was loaded from (or created with).
//!
//! ```json
//! {
//!   "tables": {
//!     "Sailors": {
//!       "file": "Sailors",
//!       "columns": ["A", "B", "C"],
//!       "stats": { "rows": 6, "pages": 1, "columns": [{"min": 1, "max": 6}, ...] },
//!       "indexes": [{ "column": "B", "clustered": true, "order": 10 }]
//!     }
//!   }
//! }
//! ```

use crate::error::{MinirelError, MinirelResult};
use crate::sql::optimizer::{ColumnRange, IndexInfo, RelationInfo, RelationStats};
use crate::storage::{PAGE_SIZE, tuples_per_page};
use crate::types::Header;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Observed value range of one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub min: i32,
    pub max: i32,
}

/// 테이블 통계 — 행 수, 페이지 수, 컬럼별 최소/최대
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableStats {
    pub rows: u64,
    pub pages: u64,
    /// One entry per column; empty when the table has no rows.
    #[serde(default)]
    pub columns: Vec<ColumnStats>,
}

/// An index declared on one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMeta {
    pub column: String,
    #[serde(default)]
    pub clustered: bool,
    /// B+-Tree order `d`: leaves hold `d..=2d` entries.
    pub order: usize,
    /// Index file; `<table file>.<column>.idx` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// Filled in by the index build.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leaf_count: Option<u64>,
}

/// 테이블 메타데이터
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMeta {
    pub file: PathBuf,
    pub columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<TableStats>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<IndexMeta>,
}

impl TableMeta {
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }
}

/// 카탈로그 — 테이블 이름 → 메타데이터
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(skip)]
    base_dir: PathBuf,
    tables: BTreeMap<String, TableMeta>,
}

impl Catalog {
    /// Empty catalog resolving relative paths against `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            tables: BTreeMap::new(),
        }
    }

    pub fn from_json(json: &str, base_dir: impl Into<PathBuf>) -> MinirelResult<Self> {
        let mut catalog: Catalog = serde_json::from_str(json)?;
        catalog.base_dir = base_dir.into();
        Ok(catalog)
    }

    pub fn to_json(&self) -> MinirelResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a catalog file; relative paths resolve against its directory.
    pub fn load(path: &Path) -> MinirelResult<Self> {
        let json = fs::read_to_string(path)?;
        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let catalog = Self::from_json(&json, base)?;
        debug!(path = %path.display(), tables = catalog.tables.len(), "loaded catalog");
        Ok(catalog)
    }

    pub fn save(&self, path: &Path) -> MinirelResult<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// `path` itself if absolute, otherwise relative to the catalog directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Register (or replace) a table.
    pub fn add_table<S: AsRef<str>>(&mut self, name: &str, file: impl Into<PathBuf>, columns: &[S]) {
        self.tables.insert(
            name.to_string(),
            TableMeta {
                file: file.into(),
                columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
                stats: None,
                indexes: Vec::new(),
            },
        );
    }

    /// Declare an index on `table.column`.
    pub fn add_index(&mut self, table: &str, column: &str, clustered: bool, order: usize) -> MinirelResult<()> {
        if order == 0 {
            return Err(MinirelError::Index("index order must be at least 1".to_string()));
        }
        let meta = self.table_mut(table)?;
        if meta.column_position(column).is_none() {
            return Err(MinirelError::ColumnNotFound {
                column: format!("{}.{}", table, column),
                schema: meta.columns.join(", "),
            });
        }
        if clustered && meta.indexes.iter().any(|i| i.clustered && i.column != column) {
            return Err(MinirelError::Index(format!(
                "table '{}' already has a clustered index",
                table
            )));
        }
        meta.indexes.retain(|i| i.column != column);
        meta.indexes.push(IndexMeta {
            column: column.to_string(),
            clustered,
            order,
            file: None,
            leaf_count: None,
        });
        Ok(())
    }

    pub fn table(&self, name: &str) -> MinirelResult<&TableMeta> {
        self.tables
            .get(name)
            .ok_or_else(|| MinirelError::TableNotFound(name.to_string()))
    }

    pub fn table_mut(&mut self, name: &str) -> MinirelResult<&mut TableMeta> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| MinirelError::TableNotFound(name.to_string()))
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Absolute path of a table's page file.
    pub fn table_path(&self, name: &str) -> MinirelResult<PathBuf> {
        Ok(self.resolve_path(&self.table(name)?.file))
    }

    /// Absolute path of the index file for `table.index.column`.
    pub fn index_path(&self, table: &str, index: &IndexMeta) -> MinirelResult<PathBuf> {
        match &index.file {
            Some(file) => Ok(self.resolve_path(file)),
            None => {
                let mut name = self.table(table)?.file.clone().into_os_string();
                name.push(format!(".{}.idx", index.column));
                Ok(self.resolve_path(Path::new(&name)))
            }
        }
    }

    /// Statistics for the optimizer. Tables never analyzed are sized from
    /// their file length, assuming full pages and unknown column ranges.
    fn relation_stats(&self, name: &str, meta: &TableMeta) -> MinirelResult<RelationStats> {
        if let Some(stats) = &meta.stats {
            let columns = if stats.columns.len() == meta.width() {
                stats
                    .columns
                    .iter()
                    .map(|c| Some(ColumnRange::new(c.min, c.max)))
                    .collect()
            } else {
                vec![None; meta.width()]
            };
            return Ok(RelationStats {
                rows: stats.rows,
                pages: stats.pages,
                columns,
            });
        }
        let bytes = fs::metadata(self.table_path(name)?)?.len();
        let pages = bytes.div_ceil(PAGE_SIZE as u64);
        Ok(RelationStats {
            rows: pages * tuples_per_page(meta.width().max(1)) as u64,
            pages,
            columns: vec![None; meta.width()],
        })
    }

    /// Everything the optimizer needs about `table` referenced as `alias`.
    /// Indexes that have not been built yet are left out.
    pub fn relation_info(&self, table: &str, alias: &str) -> MinirelResult<RelationInfo> {
        let meta = self.table(table)?;
        let mut indexes = Vec::new();
        for index in &meta.indexes {
            let Some(leaf_count) = index.leaf_count else {
                continue;
            };
            indexes.push(IndexInfo {
                column: index.column.clone(),
                clustered: index.clustered,
                order: index.order,
                path: self.index_path(table, index)?,
                leaf_count,
            });
        }
        Ok(RelationInfo {
            alias: alias.to_string(),
            table: table.to_string(),
            path: self.table_path(table)?,
            header: Header::for_table(alias, &meta.columns),
            stats: self.relation_stats(table, meta)?,
            indexes,
        })
    }
}

//! Statistics — full scans that fill the catalog's row counts and ranges

use crate::catalog::{ColumnStats, TableStats};
use crate::engine::Database;
use crate::error::{MinirelError, MinirelResult};
use crate::storage::{IoStats, PAGE_SIZE, PageReader};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

/// Scan a page file of `width`-column tuples.
pub fn compute_stats(path: &Path, width: usize, stats: Arc<IoStats>) -> MinirelResult<TableStats> {
    let pages = fs::metadata(path)?.len().div_ceil(PAGE_SIZE as u64);
    let mut reader = PageReader::open(path, stats)?;
    let mut rows = 0u64;
    let mut columns: Vec<ColumnStats> = Vec::new();
    while let Some(tuple) = reader.next_tuple()? {
        if tuple.width() != width {
            return Err(MinirelError::Schema(format!(
                "{} holds {}-column tuples, catalog declares {}",
                path.display(),
                tuple.width(),
                width
            )));
        }
        if columns.is_empty() {
            columns = tuple
                .values()
                .iter()
                .map(|&v| ColumnStats { min: v, max: v })
                .collect();
        } else {
            for (column, &v) in columns.iter_mut().zip(tuple.values()) {
                column.min = column.min.min(v);
                column.max = column.max.max(v);
            }
        }
        rows += 1;
    }
    Ok(TableStats {
        rows,
        pages,
        columns,
    })
}

impl Database {
    /// Recompute statistics for every table in the catalog.
    #[instrument(skip(self))]
    pub fn analyze(&mut self) -> MinirelResult<()> {
        let names: Vec<String> = self.catalog.table_names().map(str::to_string).collect();
        for name in names {
            self.analyze_table(&name)?;
        }
        Ok(())
    }

    /// Recompute statistics for one table.
    pub fn analyze_table(&mut self, name: &str) -> MinirelResult<()> {
        let path = self.catalog.table_path(name)?;
        let width = self.catalog.table(name)?.width();
        let stats = compute_stats(&path, width, Arc::new(IoStats::new()))?;
        info!(table = name, rows = stats.rows, pages = stats.pages, "analyzed");
        self.catalog.table_mut(name)?.stats = Some(stats);
        Ok(())
    }
}

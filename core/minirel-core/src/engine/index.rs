//! Index builds — clustering the base file and bulk loading B+-Trees

use crate::config::SortMethod;
use crate::engine::Database;
use crate::error::MinirelResult;
use crate::index::{IndexHeader, build_index};
use crate::sql::executor::operators::{ExternalSortOperator, SortKeys, TableScanOperator};
use crate::sql::executor::{ExecContext, dump_binary};
use crate::types::Header;
use std::fs;
use std::path::Path;
use tracing::{info, instrument};

/// Sort budget for clustering when the configured sort is in-memory.
const CLUSTER_SORT_PAGES: usize = 5;

/// Rewrite `path` sorted on `key_column` through an external sort.
pub fn cluster_file(
    table: &str,
    path: &Path,
    header: Header,
    key_column: usize,
    ctx: &ExecContext,
) -> MinirelResult<u64> {
    let buffer_pages = match ctx.config().sort {
        SortMethod::External { buffer_pages } => buffer_pages,
        SortMethod::InMemory => CLUSTER_SORT_PAGES,
    };
    let mut sorted_name = path.as_os_str().to_owned();
    sorted_name.push(".clustering");
    let sorted_path = Path::new(&sorted_name).to_path_buf();

    let count = {
        let scan = TableScanOperator::open(table, path, header, ctx)?;
        let mut keys = SortKeys::new();
        keys.push(key_column);
        let mut sort = ExternalSortOperator::with_keys(Box::new(scan), keys, buffer_pages, ctx)?;
        dump_binary(&mut sort, &sorted_path, ctx.stats())?
    };
    fs::rename(&sorted_path, path)?;
    Ok(count)
}

impl Database {
    /// Build every declared index. A clustered index first rewrites the
    /// base file in key order, so it is built before any unclustered one.
    #[instrument(skip(self))]
    pub fn build_indexes(&mut self) -> MinirelResult<()> {
        let names: Vec<String> = self.catalog.table_names().map(str::to_string).collect();
        for name in names {
            self.build_table_indexes(&name)?;
        }
        Ok(())
    }

    /// Build the indexes declared on one table, recording leaf counts.
    pub fn build_table_indexes(&mut self, name: &str) -> MinirelResult<()> {
        let ctx = ExecContext::new(self.config.clone());
        let path = self.catalog.table_path(name)?;
        let meta = self.catalog.table(name)?.clone();
        let header = Header::for_table(name, &meta.columns);

        let mut order: Vec<usize> = (0..meta.indexes.len()).collect();
        order.sort_by_key(|&i| !meta.indexes[i].clustered);

        let mut built: Vec<(usize, IndexHeader)> = Vec::with_capacity(order.len());
        for i in order {
            let index = &meta.indexes[i];
            let Some(column) = meta.column_position(&index.column) else {
                continue;
            };
            if index.clustered {
                let rows = cluster_file(name, &path, header.clone(), column, &ctx)?;
                info!(table = name, column = %index.column, rows, "clustered base file");
            }
            let index_path = self.catalog.index_path(name, index)?;
            let tree = build_index(&path, column, index.order, &index_path, ctx.stats())?;
            built.push((i, tree));
        }

        let meta = self.catalog.table_mut(name)?;
        for (i, tree) in built {
            meta.indexes[i].leaf_count = Some(tree.leaf_count as u64);
        }
        Ok(())
    }
}

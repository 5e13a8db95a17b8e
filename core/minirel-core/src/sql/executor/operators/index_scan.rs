//! IndexScan Operator — range lookup through a B+-Tree
//!
//! Clustered indexes locate the first qualifying Rid and then read the
//! (key-ordered) base file sequentially until the key passes the upper
//! bound. Unclustered indexes dereference every qualifying Rid.

use crate::error::MinirelResult;
use crate::index::{BTreeIndex, KeyRange, RangeCursor};
use crate::sql::executor::context::ExecContext;
use crate::sql::executor::operators::{Lookahead, SeekableSource, TupleSource};
use crate::storage::{PageReader, tuples_per_page};
use crate::types::{Header, Tuple};
use std::path::Path;
use tracing::debug;

/// Where an index lives and what it covers.
#[derive(Debug, Clone, Copy)]
pub struct IndexScanSpec<'a> {
    pub index_path: &'a Path,
    /// Position of the key column in the base header.
    pub key_column: usize,
    pub clustered: bool,
    pub range: KeyRange,
}

/// 인덱스 스캔 연산자 — B+-트리로 키 범위에 해당하는 튜플만 반환
pub struct IndexScan {
    table: String,
    header: Header,
    base: PageReader,
    index: BTreeIndex,
    cursor: RangeCursor,
    range: KeyRange,
    clustered: bool,
    /// Single-element ordering: the key column.
    ordering: [usize; 1],
    /// Clustered scans: whether the base reader has been positioned.
    positioned: bool,
    done: bool,
}

pub type IndexScanOperator = Lookahead<IndexScan>;

impl IndexScanOperator {
    pub fn open(
        table: &str,
        base_path: &Path,
        header: Header,
        spec: IndexScanSpec<'_>,
        ctx: &ExecContext,
    ) -> MinirelResult<Self> {
        let mut base = PageReader::open(base_path, ctx.stats())?;
        base.expect_width(header.len())?;
        let index = BTreeIndex::open(spec.index_path, ctx.stats())?;
        debug!(
            table,
            key_column = spec.key_column,
            clustered = spec.clustered,
            low = ?spec.range.low,
            high = ?spec.range.high,
            "opening index scan"
        );
        Ok(Lookahead::wrap(IndexScan {
            table: table.to_string(),
            header,
            base,
            index,
            cursor: RangeCursor::new(spec.range.low, spec.range.high),
            range: spec.range,
            clustered: spec.clustered,
            ordering: [spec.key_column],
            positioned: false,
            done: false,
        }))
    }
}

impl IndexScan {
    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn is_clustered(&self) -> bool {
        self.clustered
    }

    fn fetch_clustered(&mut self) -> MinirelResult<Option<Tuple>> {
        if !self.positioned {
            self.positioned = true;
            match self.cursor.next(&mut self.index)? {
                Some((_, rid)) => self.base.seek_rid(rid)?,
                None => {
                    self.done = true;
                    return Ok(None);
                }
            }
        }
        let key_column = self.ordering[0];
        while let Some(tuple) = self.base.next_tuple()? {
            let key = tuple.get(key_column);
            if self.range.high.is_some_and(|high| key > high) {
                break;
            }
            if self.range.contains(key) {
                return Ok(Some(tuple));
            }
        }
        self.done = true;
        Ok(None)
    }

    fn fetch_unclustered(&mut self) -> MinirelResult<Option<Tuple>> {
        while let Some((_, rid)) = self.cursor.next(&mut self.index)? {
            if let Some(tuple) = self.base.read_at(rid)? {
                return Ok(Some(tuple));
            }
            debug!(table = %self.table, %rid, "index entry points past the base file");
        }
        self.done = true;
        Ok(None)
    }
}

impl TupleSource for IndexScan {
    fn header(&self) -> &Header {
        &self.header
    }

    fn fetch(&mut self) -> MinirelResult<Option<Tuple>> {
        if self.done {
            return Ok(None);
        }
        if self.clustered {
            self.fetch_clustered()
        } else {
            self.fetch_unclustered()
        }
    }

    fn rewind(&mut self) -> MinirelResult<bool> {
        self.cursor.restart();
        self.base.reset()?;
        self.positioned = false;
        self.done = false;
        Ok(true)
    }

    fn release(&mut self) {
        self.done = true;
        self.base.close();
    }

    fn name(&self) -> &'static str {
        "IndexScan"
    }
}

impl SeekableSource for IndexScan {
    /// Clustered scans jump straight to the target: the base file is in key
    /// order, so the `index`-th qualifying tuple sits `index` places after
    /// the first one. Unclustered scans pass over `index` Rids in the
    /// leaves, which still costs leaf reads proportional to `index` but no
    /// base pages.
    fn seek(&mut self, index: usize) -> MinirelResult<bool> {
        self.rewind()?;
        if index == 0 {
            return Ok(true);
        }
        if self.clustered {
            self.positioned = true;
            match self.cursor.next(&mut self.index)? {
                Some((_, first)) => {
                    let per_page = tuples_per_page(self.header.len());
                    let start = first.page_id as usize * per_page + first.tuple_id as usize;
                    self.base.seek_index(start + index)?;
                }
                None => self.done = true,
            }
        } else if self.cursor.skip(&mut self.index, index)? < index {
            self.done = true;
        }
        Ok(true)
    }

    fn ordering(&self) -> &[usize] {
        &self.ordering
    }
}

//! Sort Operator — ORDER BY clause handling (in-memory variant)

use crate::error::{MinirelError, MinirelResult};
use crate::sql::executor::operators::{Lookahead, PhysicalOperator, SeekableSource, TupleSource};
use crate::types::{ColumnRef, Header, Tuple};
use smallvec::SmallVec;
use std::cmp::Ordering;

/// Sort key: column positions, most significant first.
pub type SortKeys = SmallVec<[usize; 4]>;

/// Compare two tuples on `keys` only; unlisted columns never break ties.
pub fn compare_on_keys(keys: &[usize], a: &Tuple, b: &Tuple) -> Ordering {
    for &k in keys {
        match a.get(k).cmp(&b.get(k)) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// Resolve ORDER BY columns against `header`.
pub fn resolve_sort_keys(header: &Header, order_by: &[ColumnRef]) -> MinirelResult<SortKeys> {
    Ok(header.resolve_all(order_by)?.into_iter().collect())
}

pub(crate) fn check_sort_keys(header: &Header, keys: &[usize]) -> MinirelResult<()> {
    if let Some(&bad) = keys.iter().find(|&&k| k >= header.len()) {
        return Err(MinirelError::Schema(format!(
            "sort key position {} out of range for [{}]",
            bad, header
        )));
    }
    Ok(())
}

/// 정렬 연산자 (ORDER BY) — 입력 전체를 메모리에 버퍼링 후 한 번 정렬
///
/// Only suitable when the input is known to fit in memory; see
/// `ExternalSortOperator` otherwise.
pub struct Sort {
    input: Box<dyn PhysicalOperator>,
    keys: SortKeys,
    /// Materialized sorted result (sort requires all data)
    sorted: Option<Vec<Tuple>>,
    position: usize,
}

pub type SortOperator = Lookahead<Sort>;

impl SortOperator {
    pub fn new(input: Box<dyn PhysicalOperator>, order_by: &[ColumnRef]) -> MinirelResult<Self> {
        let keys = resolve_sort_keys(input.header(), order_by)?;
        Self::with_keys(input, keys)
    }

    pub fn with_keys(input: Box<dyn PhysicalOperator>, keys: SortKeys) -> MinirelResult<Self> {
        check_sort_keys(input.header(), &keys)?;
        Ok(Lookahead::wrap(Sort {
            input,
            keys,
            sorted: None,
            position: 0,
        }))
    }
}

impl Sort {
    /// Materialize all input tuples into one sorted buffer.
    fn materialize(&mut self) -> MinirelResult<()> {
        if self.sorted.is_some() {
            return Ok(());
        }
        let mut tuples = Vec::new();
        while let Some(tuple) = self.input.next()? {
            tuples.push(tuple);
        }
        let keys = &self.keys;
        tuples.sort_by(|a, b| compare_on_keys(keys, a, b));
        self.sorted = Some(tuples);
        self.position = 0;
        Ok(())
    }
}

impl TupleSource for Sort {
    fn header(&self) -> &Header {
        self.input.header()
    }

    fn fetch(&mut self) -> MinirelResult<Option<Tuple>> {
        self.materialize()?;
        let tuple = self
            .sorted
            .as_ref()
            .and_then(|sorted| sorted.get(self.position))
            .cloned();
        if tuple.is_some() {
            self.position += 1;
        }
        Ok(tuple)
    }

    fn rewind(&mut self) -> MinirelResult<bool> {
        self.position = 0;
        Ok(true)
    }

    fn release(&mut self) {
        self.sorted = Some(Vec::new());
        self.input.close();
    }

    fn name(&self) -> &'static str {
        "Sort"
    }
}

impl SeekableSource for Sort {
    fn seek(&mut self, index: usize) -> MinirelResult<bool> {
        self.materialize()?;
        self.position = index;
        Ok(true)
    }

    fn ordering(&self) -> &[usize] {
        &self.keys
    }
}

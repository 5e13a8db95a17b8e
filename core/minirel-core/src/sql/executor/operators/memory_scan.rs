//! MemoryScan Operator — emits pre-loaded tuples

use crate::error::MinirelResult;
use crate::sql::executor::operators::{Lookahead, TupleSource};
use crate::types::{Header, Tuple};

/// 메모리 스캔 연산자 — 주입된 튜플을 순차적으로 반환
pub struct MemoryScan {
    header: Header,
    /// Pre-loaded data to emit
    data: Vec<Tuple>,
    /// Current position in data
    position: usize,
}

pub type MemoryScanOperator = Lookahead<MemoryScan>;

impl MemoryScanOperator {
    pub fn from_tuples(header: Header, data: Vec<Tuple>) -> Self {
        Lookahead::wrap(MemoryScan {
            header,
            data,
            position: 0,
        })
    }

    /// Convenience constructor from raw rows.
    pub fn from_rows(header: Header, rows: &[&[i32]]) -> Self {
        let data = rows.iter().map(|r| Tuple::new(r.to_vec())).collect();
        Self::from_tuples(header, data)
    }
}

impl MemoryScan {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl TupleSource for MemoryScan {
    fn header(&self) -> &Header {
        &self.header
    }

    fn fetch(&mut self) -> MinirelResult<Option<Tuple>> {
        let tuple = self.data.get(self.position).cloned();
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
        self.position = self.data.len();
    }

    fn name(&self) -> &'static str {
        "MemoryScan"
    }
}

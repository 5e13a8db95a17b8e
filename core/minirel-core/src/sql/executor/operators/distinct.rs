//! Distinct Operator — drops consecutive duplicates of a sorted stream

use crate::error::MinirelResult;
use crate::sql::executor::operators::{Lookahead, PhysicalOperator, TupleSource};
use crate::types::{Header, Tuple};

/// 중복 제거 연산자 — 입력이 모든 출력 컬럼으로 정렬되어 있어야 함
///
/// Sortedness is the caller's responsibility and is not checked; unsorted
/// input only loses its consecutive duplicates.
pub struct Distinct {
    input: Box<dyn PhysicalOperator>,
    previous: Option<Tuple>,
}

pub type DistinctOperator = Lookahead<Distinct>;

impl DistinctOperator {
    pub fn new(input: Box<dyn PhysicalOperator>) -> Self {
        Lookahead::wrap(Distinct {
            input,
            previous: None,
        })
    }
}

impl TupleSource for Distinct {
    fn header(&self) -> &Header {
        self.input.header()
    }

    fn fetch(&mut self) -> MinirelResult<Option<Tuple>> {
        while let Some(tuple) = self.input.next()? {
            if self.previous.as_ref() != Some(&tuple) {
                self.previous = Some(tuple.clone());
                return Ok(Some(tuple));
            }
        }
        Ok(None)
    }

    fn rewind(&mut self) -> MinirelResult<bool> {
        self.previous = None;
        self.input.reset()
    }

    fn release(&mut self) {
        self.previous = None;
        self.input.close();
    }

    fn name(&self) -> &'static str {
        "Distinct"
    }
}

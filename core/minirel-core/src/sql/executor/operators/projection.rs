//! Projection Operator — column selection and reordering

use crate::error::MinirelResult;
use crate::sql::executor::operators::{Lookahead, PhysicalOperator, TupleSource};
use crate::types::{ColumnRef, Header, Tuple};

/// 프로젝션 연산자 — 지정한 컬럼만 지정한 순서로 출력
pub struct Projection {
    input: Box<dyn PhysicalOperator>,
    indices: Vec<usize>,
    header: Header,
}

pub type ProjectionOperator = Lookahead<Projection>;

impl ProjectionOperator {
    pub fn new(input: Box<dyn PhysicalOperator>, columns: &[ColumnRef]) -> MinirelResult<Self> {
        let indices = input.header().resolve_all(columns)?;
        Ok(Self::from_indices(input, indices))
    }

    pub fn from_indices(input: Box<dyn PhysicalOperator>, indices: Vec<usize>) -> Self {
        let header = input.header().project(&indices);
        Lookahead::wrap(Projection {
            input,
            indices,
            header,
        })
    }
}

impl TupleSource for Projection {
    fn header(&self) -> &Header {
        &self.header
    }

    fn fetch(&mut self) -> MinirelResult<Option<Tuple>> {
        Ok(self.input.next()?.map(|t| t.project(&self.indices)))
    }

    fn rewind(&mut self) -> MinirelResult<bool> {
        self.input.reset()
    }

    fn release(&mut self) {
        self.input.close();
    }

    fn name(&self) -> &'static str {
        "Projection"
    }
}

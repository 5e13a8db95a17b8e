//! Filter Operator — WHERE clause evaluation

use crate::error::MinirelResult;
use crate::sql::executor::expr::{PhysicalExpr, evaluate_predicate};
use crate::sql::executor::operators::{Lookahead, PhysicalOperator, TupleSource};
use crate::sql::planner::Expr;
use crate::types::{Header, Tuple};

/// 필터 연산자 (WHERE 조건) — 술어를 만족하는 튜플만 통과
pub struct Filter {
    input: Box<dyn PhysicalOperator>,
    predicate: PhysicalExpr,
}

pub type FilterOperator = Lookahead<Filter>;

impl FilterOperator {
    /// Bind `predicate` against the child's header; unresolved columns fail here.
    pub fn new(input: Box<dyn PhysicalOperator>, predicate: &Expr) -> MinirelResult<Self> {
        let predicate = predicate.bind(input.header())?;
        Ok(Lookahead::wrap(Filter { input, predicate }))
    }
}

impl TupleSource for Filter {
    fn header(&self) -> &Header {
        self.input.header()
    }

    fn fetch(&mut self) -> MinirelResult<Option<Tuple>> {
        while let Some(tuple) = self.input.next()? {
            if evaluate_predicate(&self.predicate, &tuple)? {
                return Ok(Some(tuple));
            }
        }
        Ok(None)
    }

    fn rewind(&mut self) -> MinirelResult<bool> {
        self.input.reset()
    }

    fn release(&mut self) {
        self.input.close();
    }

    fn name(&self) -> &'static str {
        "Filter"
    }
}

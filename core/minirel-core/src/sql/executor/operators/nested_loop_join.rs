//! Tuple Nested Loop Join — rescans the inner child once per outer tuple

use crate::error::{MinirelError, MinirelResult};
use crate::sql::executor::expr::{PhysicalExpr, evaluate_predicate};
use crate::sql::executor::operators::{Lookahead, PhysicalOperator, TupleSource};
use crate::sql::planner::Expr;
use crate::types::{Header, Tuple};

/// Bind an optional join condition against the concatenated header.
pub(crate) fn bind_join_condition(
    header: &Header,
    condition: Option<&Expr>,
) -> MinirelResult<Option<PhysicalExpr>> {
    condition.map(|expr| expr.bind(header)).transpose()
}

pub(crate) fn passes(condition: &Option<PhysicalExpr>, tuple: &Tuple) -> MinirelResult<bool> {
    match condition {
        Some(expr) => evaluate_predicate(expr, tuple),
        None => Ok(true),
    }
}

/// 튜플 중첩 루프 조인 — 외부 튜플마다 내부 자식을 처음부터 다시 읽음
///
/// Output order is outer-major: every match of the first outer tuple,
/// then every match of the second, and so on.
pub struct NestedLoopJoin {
    left: Box<dyn PhysicalOperator>,
    right: Box<dyn PhysicalOperator>,
    header: Header,
    condition: Option<PhysicalExpr>,
    /// Outer tuple currently being matched.
    outer: Option<Tuple>,
}

pub type NestedLoopJoinOperator = Lookahead<NestedLoopJoin>;

impl NestedLoopJoinOperator {
    /// `condition` of `None` is a cross product.
    pub fn new(
        left: Box<dyn PhysicalOperator>,
        right: Box<dyn PhysicalOperator>,
        condition: Option<&Expr>,
    ) -> MinirelResult<Self> {
        let header = left.header().join(right.header());
        let condition = bind_join_condition(&header, condition)?;
        Ok(Lookahead::wrap(NestedLoopJoin {
            left,
            right,
            header,
            condition,
            outer: None,
        }))
    }
}

impl TupleSource for NestedLoopJoin {
    fn header(&self) -> &Header {
        &self.header
    }

    fn fetch(&mut self) -> MinirelResult<Option<Tuple>> {
        loop {
            if self.outer.is_none() {
                self.outer = self.left.next()?;
            }
            let Some(outer) = self.outer.as_ref() else {
                return Ok(None);
            };
            match self.right.next()? {
                Some(inner) => {
                    let joined = outer.join(&inner);
                    if passes(&self.condition, &joined)? {
                        return Ok(Some(joined));
                    }
                }
                None => {
                    self.outer = None;
                    if !self.left.has_next()? {
                        return Ok(None);
                    }
                    if !self.right.reset()? {
                        return Err(MinirelError::NotRestartable(self.right.name().to_string()));
                    }
                }
            }
        }
    }

    fn rewind(&mut self) -> MinirelResult<bool> {
        self.outer = None;
        Ok(self.left.reset()? && self.right.reset()?)
    }

    fn release(&mut self) {
        self.outer = None;
        self.left.close();
        self.right.close();
    }

    fn name(&self) -> &'static str {
        "NestedLoopJoin"
    }
}

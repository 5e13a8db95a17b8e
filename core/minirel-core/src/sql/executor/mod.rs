//! SQL Query Executor Module

use crate::error::MinirelResult;
use crate::types::Tuple;

pub mod context;
pub mod expr;
pub mod operators;
pub mod output;

pub use context::ExecContext;
pub use expr::{PhysicalExpr, evaluate_expr, evaluate_predicate};
pub use operators::{
    BlockNestedLoopJoinOperator, DistinctOperator, ExternalSortOperator, FilterOperator,
    IndexScanOperator, MemoryScanOperator, NestedLoopJoinOperator, PhysicalOperator,
    ProjectionOperator, SortMergeJoinOperator, SortOperator, SortedOperator, TableScanOperator,
};
pub use output::{dump_binary, dump_text};

/// Pull `op` to exhaustion.
pub fn collect_all<O: PhysicalOperator + ?Sized>(op: &mut O) -> MinirelResult<Vec<Tuple>> {
    let mut tuples = Vec::new();
    while let Some(tuple) = op.next()? {
        tuples.push(tuple);
    }
    Ok(tuples)
}

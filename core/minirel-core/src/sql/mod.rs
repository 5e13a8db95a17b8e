// SQL 모듈 진입점
pub mod executor;
pub mod optimizer;
pub mod parser;
pub mod planner;

pub use executor::{
    ExecContext, FilterOperator, PhysicalOperator, ProjectionOperator, SortOperator,
    TableScanOperator, evaluate_expr,
};
pub use optimizer::{OptimizedQuery, QueryOptimizer};
pub use parser::SqlParser;
pub use planner::{CompareOp, Expr, LogicalPlan, LogicalPlanner, PhysicalPlanner, QueryBlock};

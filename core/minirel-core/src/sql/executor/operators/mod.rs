//! Physical Operators Module

pub mod block_cache;
mod block_join;
mod distinct;
mod external_sort;
mod filter;
mod index_scan;
mod memory_scan;
mod merge_join;
mod nested_loop_join;
mod physical_operator;
mod projection;
mod sort;
mod table_scan;

pub use block_cache::BlockCache;
pub use block_join::{BlockNestedLoopJoin, BlockNestedLoopJoinOperator};
pub use distinct::{Distinct, DistinctOperator};
pub use external_sort::{ExternalSort, ExternalSortOperator};
pub use filter::{Filter, FilterOperator};
pub use index_scan::{IndexScan, IndexScanOperator, IndexScanSpec};
pub use memory_scan::{MemoryScan, MemoryScanOperator};
pub use merge_join::{SortMergeJoin, SortMergeJoinOperator};
pub use nested_loop_join::{NestedLoopJoin, NestedLoopJoinOperator};
pub use physical_operator::{
    Lookahead, PhysicalOperator, SeekableSource, SortedOperator, TupleSource,
};
pub use projection::{Projection, ProjectionOperator};
pub use sort::{Sort, SortKeys, SortOperator, compare_on_keys, resolve_sort_keys};
pub use table_scan::{TableScan, TableScanOperator};

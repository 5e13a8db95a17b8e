//! B+-Tree Index — static, bulk-loaded, page-file backed
//!
//! Trees are built once from a base relation ([`build_index`]) and never
//! modified; lookups go through [`BTreeIndex`] and a [`RangeCursor`].

pub mod btree;
pub mod bulk_load;
pub mod reader;

pub use btree::{DataEntry, IndexHeader, Node};
pub use bulk_load::{BulkLoader, build_index, collect_entries};
pub use reader::{BTreeIndex, KeyRange, RangeCursor};

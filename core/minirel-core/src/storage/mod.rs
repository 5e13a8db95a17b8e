//! Storage module — fixed-size page files of packed integer tuples.
//!
//! Base relations, external-sort runs and binary query output all share the
//! same page layout (see [`page`]). The executor never touches raw bytes:
//! it reads through [`PageReader`] and writes through [`PageWriter`].

pub mod page;
pub mod reader;
pub mod stats;
pub mod writer;

pub use page::{PAGE_HEADER_SIZE, PAGE_SIZE, Rid, tuples_per_page};
pub use reader::{PageReader, read_relation};
pub use stats::{IoSnapshot, IoStats};
pub use writer::{PageWriter, write_relation};

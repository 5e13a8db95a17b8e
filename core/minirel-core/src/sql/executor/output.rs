//! Result output — text and binary page-format dumps of an operator tree.

use crate::error::MinirelResult;
use crate::sql::executor::operators::PhysicalOperator;
use crate::storage::{IoStats, PageWriter};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Write every tuple as one comma-separated line. Returns the tuple count.
pub fn dump_text<O, W>(op: &mut O, out: &mut W) -> MinirelResult<u64>
where
    O: PhysicalOperator + ?Sized,
    W: Write,
{
    let mut count = 0;
    while let Some(tuple) = op.next()? {
        writeln!(out, "{}", tuple)?;
        count += 1;
    }
    out.flush()?;
    Ok(count)
}

/// Write every tuple to `path` in the base-relation page format, so the
/// result can be scanned again. Returns the tuple count.
pub fn dump_binary<O>(op: &mut O, path: &Path, stats: Arc<IoStats>) -> MinirelResult<u64>
where
    O: PhysicalOperator + ?Sized,
{
    let width = op.header().len();
    let mut writer = PageWriter::create(path, width, stats)?;
    while let Some(tuple) = op.next()? {
        writer.write(&tuple)?;
    }
    let count = writer.tuples_written();
    let pages = writer.finish()?;
    debug!(path = %path.display(), tuples = count, pages, "binary dump complete");
    Ok(count)
}

//! PageWriter — buffers tuples into pages and appends them to a file.

use crate::error::{MinirelError, MinirelResult};
use crate::storage::page::{PAGE_SIZE, encode_page, tuples_per_page};
use crate::storage::stats::IoStats;
use crate::types::Tuple;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Writes tuples of a fixed width as a sequence of full pages; only the
/// final page may be partially filled.
pub struct PageWriter {
    path: PathBuf,
    out: BufWriter<File>,
    width: usize,
    capacity: usize,
    pending: Vec<Tuple>,
    buf: Box<[u8; PAGE_SIZE]>,
    pages_written: u64,
    tuples_written: u64,
    stats: Arc<IoStats>,
}

impl PageWriter {
    /// Create (or truncate) `path` for tuples of `width` integers.
    pub fn create(path: &Path, width: usize, stats: Arc<IoStats>) -> MinirelResult<Self> {
        let capacity = tuples_per_page(width);
        if capacity == 0 {
            return Err(MinirelError::Schema(format!(
                "tuple width {} cannot be stored in a {}-byte page",
                width, PAGE_SIZE
            )));
        }
        let file = File::create(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            out: BufWriter::new(file),
            width,
            capacity,
            pending: Vec::with_capacity(capacity),
            buf: Box::new([0u8; PAGE_SIZE]),
            pages_written: 0,
            tuples_written: 0,
            stats,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn tuples_written(&self) -> u64 {
        self.tuples_written
    }

    /// Append one tuple, flushing a page once it is full.
    pub fn write(&mut self, tuple: &Tuple) -> MinirelResult<()> {
        if tuple.width() != self.width {
            return Err(MinirelError::Schema(format!(
                "tuple of width {} written to {} (width {})",
                tuple.width(),
                self.path.display(),
                self.width
            )));
        }
        self.pending.push(tuple.clone());
        self.tuples_written += 1;
        if self.pending.len() == self.capacity {
            self.flush_page()?;
        }
        Ok(())
    }

    fn flush_page(&mut self) -> MinirelResult<()> {
        encode_page(self.width, &self.pending, &mut self.buf)?;
        self.out.write_all(&self.buf[..])?;
        self.pending.clear();
        self.pages_written += 1;
        self.stats.record_page_written();
        Ok(())
    }

    /// Flush the trailing partial page and the OS buffer. Returns the number
    /// of pages in the file.
    pub fn finish(mut self) -> MinirelResult<u64> {
        if !self.pending.is_empty() {
            self.flush_page()?;
        }
        self.out.flush()?;
        Ok(self.pages_written)
    }
}

/// Write a whole relation in one call.
pub fn write_relation(
    path: &Path,
    width: usize,
    tuples: &[Tuple],
    stats: Arc<IoStats>,
) -> MinirelResult<u64> {
    let mut writer = PageWriter::create(path, width, stats)?;
    for tuple in tuples {
        writer.write(tuple)?;
    }
    writer.finish()
}

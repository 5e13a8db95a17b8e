//! PageReader — sequential and positional tuple access over a page file.
//!
//! Opening a missing file is an error. Once open, any short or unreadable
//! page is treated as the end of the file: the reader reports no further
//! tuples rather than failing mid-query.

use crate::error::{MinirelError, MinirelResult};
use crate::storage::page::{PAGE_SIZE, Rid, decode_page, tuples_per_page};
use crate::storage::stats::IoStats;
use crate::types::Tuple;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Page-at-a-time reader. Holds exactly one decoded page in memory.
pub struct PageReader {
    path: PathBuf,
    file: Option<File>,
    buf: Box<[u8; PAGE_SIZE]>,
    /// Tuples of the currently loaded page.
    page: Vec<Tuple>,
    /// Id of the currently loaded page, if any.
    page_id: Option<u32>,
    /// Next tuple offset within `page`.
    pos: usize,
    width: Option<usize>,
    exhausted: bool,
    stats: Arc<IoStats>,
}

impl PageReader {
    pub fn open(path: &Path, stats: Arc<IoStats>) -> MinirelResult<Self> {
        let file = File::open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            buf: Box::new([0u8; PAGE_SIZE]),
            page: Vec::new(),
            page_id: None,
            pos: 0,
            width: None,
            exhausted: false,
            stats,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Tuple width, known once the first page has been read.
    pub fn width(&mut self) -> Option<usize> {
        if self.width.is_none() && self.page_id.is_none() {
            self.load_page(0);
            self.page_id = None;
            self.page.clear();
            self.pos = 0;
            self.exhausted = false;
        }
        self.width
    }

    /// Fail with a schema error when the file's tuples are not `expected`
    /// fields wide. An empty file matches any width.
    pub fn expect_width(&mut self, expected: usize) -> MinirelResult<()> {
        match self.width() {
            Some(width) if width != expected => Err(MinirelError::Schema(format!(
                "{} holds tuples of width {}, expected {}",
                self.path.display(),
                width,
                expected
            ))),
            _ => Ok(()),
        }
    }

    /// Read page `page_id` into memory. Returns false on EOF or a failed read.
    fn load_page(&mut self, page_id: u32) -> bool {
        let Some(file) = self.file.as_mut() else {
            return false;
        };
        let offset = page_id as u64 * PAGE_SIZE as u64;
        let read = file
            .seek(SeekFrom::Start(offset))
            .and_then(|_| file.read_exact(&mut self.buf[..]));
        if let Err(err) = read {
            if err.kind() != std::io::ErrorKind::UnexpectedEof {
                debug!(path = %self.path.display(), page_id, error = %err, "page read failed, treating as end of file");
            }
            return false;
        }
        self.stats.record_page_read();
        match decode_page(&self.buf) {
            Ok((width, tuples)) => {
                self.width = Some(width);
                self.page = tuples;
                self.page_id = Some(page_id);
                self.pos = 0;
                true
            }
            Err(err) => {
                debug!(path = %self.path.display(), page_id, error = %err, "undecodable page, treating as end of file");
                false
            }
        }
    }

    /// Next tuple together with its record id.
    pub fn next_with_rid(&mut self) -> MinirelResult<Option<(Rid, Tuple)>> {
        if self.exhausted {
            return Ok(None);
        }
        while self.page_id.is_none() || self.pos >= self.page.len() {
            let next_page = self.page_id.map_or(0, |id| id + 1);
            if !self.load_page(next_page) {
                self.exhausted = true;
                return Ok(None);
            }
        }
        let page_id = self.page_id.unwrap_or(0);
        let rid = Rid::new(page_id, self.pos as u32);
        let tuple = self.page[self.pos].clone();
        self.pos += 1;
        Ok(Some((rid, tuple)))
    }

    pub fn next_tuple(&mut self) -> MinirelResult<Option<Tuple>> {
        Ok(self.next_with_rid()?.map(|(_, tuple)| tuple))
    }

    /// Position the reader so the next tuple returned is the one at `rid`.
    pub fn seek_rid(&mut self, rid: Rid) -> MinirelResult<()> {
        self.exhausted = false;
        if self.page_id != Some(rid.page_id) && !self.load_page(rid.page_id) {
            self.exhausted = true;
            return Ok(());
        }
        self.pos = rid.tuple_id as usize;
        Ok(())
    }

    /// Position the reader at the `index`-th tuple of the file. Relies on
    /// every page but the last being full, which [`PageWriter`] guarantees.
    ///
    /// [`PageWriter`]: crate::storage::PageWriter
    pub fn seek_index(&mut self, index: usize) -> MinirelResult<()> {
        let Some(width) = self.width() else {
            // empty file: nothing to position on
            self.exhausted = true;
            return Ok(());
        };
        let per_page = tuples_per_page(width);
        let rid = Rid::new((index / per_page) as u32, (index % per_page) as u32);
        self.seek_rid(rid)
    }

    /// Fetch the tuple at `rid` directly.
    pub fn read_at(&mut self, rid: Rid) -> MinirelResult<Option<Tuple>> {
        if self.page_id != Some(rid.page_id) && !self.load_page(rid.page_id) {
            return Ok(None);
        }
        Ok(self.page.get(rid.tuple_id as usize).cloned())
    }

    /// Reopen the file and position at its first page.
    pub fn reset(&mut self) -> MinirelResult<()> {
        self.file = Some(File::open(&self.path)?);
        self.page.clear();
        self.page_id = None;
        self.pos = 0;
        self.exhausted = false;
        Ok(())
    }

    /// Release the file handle. Further reads report end of file.
    pub fn close(&mut self) {
        self.file = None;
        self.page.clear();
        self.page_id = None;
        self.exhausted = true;
    }
}

/// Read a whole relation into memory.
pub fn read_relation(path: &Path, stats: Arc<IoStats>) -> MinirelResult<Vec<Tuple>> {
    let mut reader = PageReader::open(path, stats)?;
    let mut tuples = Vec::new();
    while let Some(tuple) = reader.next_tuple()? {
        tuples.push(tuple);
    }
    Ok(tuples)
}

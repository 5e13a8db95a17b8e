//! Index reader — root-to-leaf search and leaf-chain range cursors.

use crate::error::{MinirelError, MinirelResult};
use crate::index::btree::{DataEntry, IndexHeader, Node};
use crate::storage::page::PAGE_SIZE;
use crate::storage::{IoStats, Rid};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// B+-Tree 인덱스 파일 핸들 — 노드를 한 페이지씩 읽음
pub struct BTreeIndex {
    path: PathBuf,
    file: File,
    header: IndexHeader,
    buf: Box<[u8; PAGE_SIZE]>,
    stats: Arc<IoStats>,
}

impl BTreeIndex {
    pub fn open(path: &Path, stats: Arc<IoStats>) -> MinirelResult<Self> {
        let mut file = File::open(path)?;
        let mut buf = Box::new([0u8; PAGE_SIZE]);
        file.read_exact(&mut buf[..])?;
        stats.record_page_read();
        let header = IndexHeader::decode(&buf)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            header,
            buf,
            stats,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> IndexHeader {
        self.header
    }

    pub fn leaf_count(&self) -> u32 {
        self.header.leaf_count
    }

    pub fn read_node(&mut self, page_id: u32) -> MinirelResult<Node> {
        self.file
            .seek(SeekFrom::Start(page_id as u64 * PAGE_SIZE as u64))?;
        self.file.read_exact(&mut self.buf[..])?;
        self.stats.record_page_read();
        Node::decode(&self.buf)
    }

    /// Leaf page that would hold `key`; the first leaf when unbounded.
    pub fn find_leaf(&mut self, key: Option<i32>) -> MinirelResult<u32> {
        let Some(key) = key else {
            return Ok(1);
        };
        let mut page = self.header.root;
        loop {
            match self.read_node(page)? {
                Node::Leaf(_) => return Ok(page),
                node @ Node::Internal { .. } => {
                    page = node.child_for(key).ok_or_else(|| {
                        MinirelError::Index(format!("internal node {} has no children", page))
                    })?;
                }
            }
        }
    }

    /// Every (key, Rid) with `low <= key <= high`, ascending.
    pub fn range(&mut self, low: Option<i32>, high: Option<i32>) -> MinirelResult<Vec<(i32, Rid)>> {
        let mut cursor = RangeCursor::new(low, high);
        let mut out = Vec::new();
        while let Some(pair) = cursor.next(self)? {
            out.push(pair);
        }
        Ok(out)
    }
}

/// Inclusive key bounds; `None` is unbounded on that side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyRange {
    pub low: Option<i32>,
    pub high: Option<i32>,
}

impl KeyRange {
    pub fn new(low: Option<i32>, high: Option<i32>) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, key: i32) -> bool {
        self.low.is_none_or(|low| key >= low) && self.high.is_none_or(|high| key <= high)
    }

    pub fn is_unbounded(&self) -> bool {
        self.low.is_none() && self.high.is_none()
    }
}

/// Position in the leaf chain of a range lookup. Kept apart from
/// [`BTreeIndex`] so an owner can hold both and restart the cursor.
#[derive(Debug, Clone)]
pub struct RangeCursor {
    low: Option<i32>,
    high: Option<i32>,
    leaf: Option<u32>,
    entries: Vec<DataEntry>,
    entry: usize,
    rid: usize,
    done: bool,
}

impl RangeCursor {
    pub fn new(low: Option<i32>, high: Option<i32>) -> Self {
        Self {
            low,
            high,
            leaf: None,
            entries: Vec::new(),
            entry: 0,
            rid: 0,
            done: false,
        }
    }

    pub fn restart(&mut self) {
        *self = Self::new(self.low, self.high);
    }

    fn load_leaf(&mut self, index: &mut BTreeIndex, page: u32) -> MinirelResult<()> {
        self.entries = match index.read_node(page)? {
            Node::Leaf(entries) => entries,
            Node::Internal { .. } => {
                return Err(MinirelError::Index(format!("page {} is not a leaf", page)));
            }
        };
        self.leaf = Some(page);
        self.entry = 0;
        self.rid = 0;
        Ok(())
    }

    /// Move to the next in-range entry with Rids left. False once past
    /// `high` or the last leaf.
    fn settle(&mut self, index: &mut BTreeIndex) -> MinirelResult<bool> {
        if self.done {
            return Ok(false);
        }
        if self.leaf.is_none() {
            let page = index.find_leaf(self.low)?;
            self.load_leaf(index, page)?;
        }
        loop {
            let Some(entry) = self.entries.get(self.entry) else {
                let next = self.leaf.map_or(1, |page| page + 1);
                if next > index.leaf_count() {
                    self.done = true;
                    return Ok(false);
                }
                self.load_leaf(index, next)?;
                continue;
            };
            if self.low.is_some_and(|low| entry.key < low) {
                self.entry += 1;
                continue;
            }
            if self.high.is_some_and(|high| entry.key > high) {
                self.done = true;
                return Ok(false);
            }
            if self.rid < entry.rids.len() {
                return Ok(true);
            }
            self.entry += 1;
            self.rid = 0;
        }
    }

    /// Next matching (key, Rid), or `None` once past `high`.
    pub fn next(&mut self, index: &mut BTreeIndex) -> MinirelResult<Option<(i32, Rid)>> {
        if !self.settle(index)? {
            return Ok(None);
        }
        let entry = &self.entries[self.entry];
        let rid = entry.rids[self.rid];
        self.rid += 1;
        Ok(Some((entry.key, rid)))
    }

    /// Pass over up to `n` matching Rids, a whole entry at a time where
    /// possible. Only leaf pages are read. Returns how many were skipped.
    pub fn skip(&mut self, index: &mut BTreeIndex, n: usize) -> MinirelResult<usize> {
        let mut skipped = 0;
        while skipped < n && self.settle(index)? {
            let left = self.entries[self.entry].rids.len() - self.rid;
            let take = left.min(n - skipped);
            self.rid += take;
            skipped += take;
        }
        Ok(skipped)
    }
}

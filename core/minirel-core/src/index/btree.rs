//! B+-Tree node layout and page codec.
//!
//! Page 0 of an index file is the header `[root][leaf count][order]`.
//! Leaves follow on pages `1..=leaf_count` in key order, then internal
//! nodes bottom-up with the root written last.
//!
//! Leaf page:     `[0][entry count]` then per entry `[key][rid count]([page][tuple])*`
//! Internal page: `[1][key count][keys...][child page ids...]`

use crate::error::{MinirelError, MinirelResult};
use crate::storage::page::{PAGE_SIZE, read_i32, write_i32};
use crate::storage::Rid;

const INT_SIZE: usize = 4;
pub(crate) const NODE_HEADER_SIZE: usize = 2 * INT_SIZE;
const LEAF_TAG: i32 = 0;
const INTERNAL_TAG: i32 = 1;
/// Upper bound on any per-page count, for preallocation.
const MAX_SLOTS: usize = PAGE_SIZE / INT_SIZE;

/// One leaf entry: a key and every record id holding it, ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataEntry {
    pub key: i32,
    pub rids: Vec<Rid>,
}

impl DataEntry {
    pub fn new(key: i32, rids: Vec<Rid>) -> Self {
        Self { key, rids }
    }

    /// Bytes this entry occupies in a leaf page.
    pub fn size_on_disk(&self) -> usize {
        2 * INT_SIZE + self.rids.len() * 2 * INT_SIZE
    }
}

/// Decoded index node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Leaf(Vec<DataEntry>),
    /// `children.len() == keys.len() + 1`; `keys[i]` is the smallest key
    /// reachable through `children[i + 1]`.
    Internal { keys: Vec<i32>, children: Vec<u32> },
}

impl Node {
    pub fn size_on_disk(&self) -> usize {
        match self {
            Node::Leaf(entries) => {
                NODE_HEADER_SIZE + entries.iter().map(DataEntry::size_on_disk).sum::<usize>()
            }
            Node::Internal { keys, children } => {
                NODE_HEADER_SIZE + (keys.len() + children.len()) * INT_SIZE
            }
        }
    }

    /// Child to descend into for `key`: the first child whose separator is
    /// greater than `key`, else the last child. `None` for leaves.
    pub fn child_for(&self, key: i32) -> Option<u32> {
        match self {
            Node::Leaf(_) => None,
            Node::Internal { keys, children } => {
                let slot = keys.partition_point(|&separator| separator <= key);
                children.get(slot).copied()
            }
        }
    }

    pub fn encode(&self, buf: &mut [u8; PAGE_SIZE]) -> MinirelResult<()> {
        let size = self.size_on_disk();
        if size > PAGE_SIZE {
            return Err(MinirelError::Index(format!(
                "node of {} bytes does not fit in a {}-byte page",
                size, PAGE_SIZE
            )));
        }
        buf.fill(0);
        match self {
            Node::Leaf(entries) => {
                write_i32(buf, 0, LEAF_TAG);
                write_i32(buf, INT_SIZE, entries.len() as i32);
                let mut offset = NODE_HEADER_SIZE;
                for entry in entries {
                    write_i32(buf, offset, entry.key);
                    write_i32(buf, offset + INT_SIZE, entry.rids.len() as i32);
                    offset += 2 * INT_SIZE;
                    for rid in &entry.rids {
                        write_i32(buf, offset, rid.page_id as i32);
                        write_i32(buf, offset + INT_SIZE, rid.tuple_id as i32);
                        offset += 2 * INT_SIZE;
                    }
                }
            }
            Node::Internal { keys, children } => {
                write_i32(buf, 0, INTERNAL_TAG);
                write_i32(buf, INT_SIZE, keys.len() as i32);
                let mut offset = NODE_HEADER_SIZE;
                for &key in keys {
                    write_i32(buf, offset, key);
                    offset += INT_SIZE;
                }
                for &child in children {
                    write_i32(buf, offset, child as i32);
                    offset += INT_SIZE;
                }
            }
        }
        Ok(())
    }

    pub fn decode(buf: &[u8; PAGE_SIZE]) -> MinirelResult<Node> {
        let mut cursor = PageCursor { buf, offset: 0 };
        let tag = cursor.int()?;
        let count = cursor.count()?;
        match tag {
            LEAF_TAG => {
                let mut entries = Vec::with_capacity(count.min(MAX_SLOTS));
                for _ in 0..count {
                    let key = cursor.int()?;
                    let rid_count = cursor.count()?;
                    let mut rids = Vec::with_capacity(rid_count.min(MAX_SLOTS));
                    for _ in 0..rid_count {
                        let page_id = cursor.count()? as u32;
                        let tuple_id = cursor.count()? as u32;
                        rids.push(Rid::new(page_id, tuple_id));
                    }
                    entries.push(DataEntry { key, rids });
                }
                Ok(Node::Leaf(entries))
            }
            INTERNAL_TAG => {
                let mut keys = Vec::with_capacity(count.min(MAX_SLOTS));
                for _ in 0..count {
                    keys.push(cursor.int()?);
                }
                let mut children = Vec::with_capacity(count.min(MAX_SLOTS) + 1);
                for _ in 0..=count {
                    children.push(cursor.count()? as u32);
                }
                Ok(Node::Internal { keys, children })
            }
            other => Err(MinirelError::Index(format!("unknown node tag {}", other))),
        }
    }
}

/// Bounds-checked sequential reads over a page buffer.
struct PageCursor<'a> {
    buf: &'a [u8; PAGE_SIZE],
    offset: usize,
}

impl PageCursor<'_> {
    fn int(&mut self) -> MinirelResult<i32> {
        if self.offset + INT_SIZE > PAGE_SIZE {
            return Err(MinirelError::Index("node runs past the end of its page".into()));
        }
        let value = read_i32(self.buf, self.offset);
        self.offset += INT_SIZE;
        Ok(value)
    }

    /// A non-negative integer (count or page id).
    fn count(&mut self) -> MinirelResult<usize> {
        let value = self.int()?;
        usize::try_from(value)
            .map_err(|_| MinirelError::Index(format!("negative count or page id {}", value)))
    }
}

/// Index file header (page 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexHeader {
    pub root: u32,
    pub leaf_count: u32,
    pub order: u32,
}

impl IndexHeader {
    pub fn encode(&self, buf: &mut [u8; PAGE_SIZE]) {
        buf.fill(0);
        write_i32(buf, 0, self.root as i32);
        write_i32(buf, INT_SIZE, self.leaf_count as i32);
        write_i32(buf, 2 * INT_SIZE, self.order as i32);
    }

    pub fn decode(buf: &[u8; PAGE_SIZE]) -> MinirelResult<Self> {
        let mut cursor = PageCursor { buf, offset: 0 };
        let header = Self {
            root: cursor.count()? as u32,
            leaf_count: cursor.count()? as u32,
            order: cursor.count()? as u32,
        };
        if header.leaf_count == 0 || header.root == 0 || header.order == 0 {
            return Err(MinirelError::Index(format!(
                "corrupt index header: root {}, {} leaves, order {}",
                header.root, header.leaf_count, header.order
            )));
        }
        Ok(header)
    }
}

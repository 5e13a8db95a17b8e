//! Block cache — buffers one page-budget worth of tuples from a child.
//!
//! Used as the outer block of the block nested loop join and as the
//! pass-0 batch of external sort.

use crate::error::MinirelResult;
use crate::sql::executor::operators::PhysicalOperator;
use crate::storage::tuples_per_page;
use crate::types::{Header, Tuple};

pub struct BlockCache {
    child: Box<dyn PhysicalOperator>,
    /// Maximum tuples held at once (`pages × tuples per page`, at least 1).
    capacity: usize,
    block: Vec<Tuple>,
}

impl BlockCache {
    pub fn new(child: Box<dyn PhysicalOperator>, buffer_pages: usize) -> Self {
        let width = child.header().len();
        let capacity = (buffer_pages * tuples_per_page(width)).max(1);
        Self {
            child,
            capacity,
            block: Vec::with_capacity(capacity),
        }
    }

    pub fn header(&self) -> &Header {
        self.child.header()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Tuples of the current block.
    pub fn block(&self) -> &[Tuple] {
        &self.block
    }

    /// Take ownership of the current block, leaving it empty.
    pub fn take_block(&mut self) -> Vec<Tuple> {
        std::mem::take(&mut self.block)
    }

    /// Replace the current block with the next `capacity` tuples of the
    /// child. Returns whether any tuple was loaded.
    pub fn load_next_block(&mut self) -> MinirelResult<bool> {
        self.block.clear();
        while self.block.len() < self.capacity {
            match self.child.next()? {
                Some(tuple) => self.block.push(tuple),
                None => break,
            }
        }
        Ok(!self.block.is_empty())
    }

    /// Drop the current block and restart the child.
    pub fn reset(&mut self) -> MinirelResult<bool> {
        self.block.clear();
        self.child.reset()
    }

    pub fn close(&mut self) {
        self.block.clear();
        self.child.close();
    }
}

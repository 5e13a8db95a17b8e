//! Block Nested Loop Join — rescans the inner child once per outer block

use crate::error::{MinirelError, MinirelResult};
use crate::sql::executor::expr::PhysicalExpr;
use crate::sql::executor::operators::block_cache::BlockCache;
use crate::sql::executor::operators::nested_loop_join::{bind_join_condition, passes};
use crate::sql::executor::operators::{Lookahead, PhysicalOperator, TupleSource};
use crate::sql::planner::Expr;
use crate::types::{Header, Tuple};

/// 블록 중첩 루프 조인 — 외부 입력을 버퍼 페이지 단위 블록으로 읽음
///
/// Within a block the output is inner-major: each inner tuple is paired
/// with every tuple of the block before the next inner tuple is read.
pub struct BlockNestedLoopJoin {
    outer: BlockCache,
    right: Box<dyn PhysicalOperator>,
    header: Header,
    condition: Option<PhysicalExpr>,
    /// Inner tuple currently paired with the block.
    inner: Option<Tuple>,
    /// Next block position to pair with `inner`.
    position: usize,
    started: bool,
    done: bool,
}

pub type BlockNestedLoopJoinOperator = Lookahead<BlockNestedLoopJoin>;

impl BlockNestedLoopJoinOperator {
    pub fn new(
        left: Box<dyn PhysicalOperator>,
        right: Box<dyn PhysicalOperator>,
        condition: Option<&Expr>,
        buffer_pages: usize,
    ) -> MinirelResult<Self> {
        if buffer_pages < 1 {
            return Err(MinirelError::InvalidBufferSize {
                operator: "block nested loop join",
                minimum: 1,
                actual: buffer_pages,
            });
        }
        let header = left.header().join(right.header());
        let condition = bind_join_condition(&header, condition)?;
        Ok(Lookahead::wrap(BlockNestedLoopJoin {
            outer: BlockCache::new(left, buffer_pages),
            right,
            header,
            condition,
            inner: None,
            position: 0,
            started: false,
            done: false,
        }))
    }
}

impl BlockNestedLoopJoin {
    /// Outer tuples held per block.
    pub fn block_capacity(&self) -> usize {
        self.outer.capacity()
    }
}

impl TupleSource for BlockNestedLoopJoin {
    fn header(&self) -> &Header {
        &self.header
    }

    fn fetch(&mut self) -> MinirelResult<Option<Tuple>> {
        if self.done {
            return Ok(None);
        }
        if !self.started {
            self.started = true;
            if !self.outer.load_next_block()? {
                self.done = true;
                return Ok(None);
            }
        }
        loop {
            if self.inner.is_none() {
                self.inner = self.right.next()?;
                self.position = 0;
            }
            let Some(inner) = self.inner.as_ref() else {
                // inner exhausted: next block, rescan
                if !self.outer.load_next_block()? {
                    self.done = true;
                    return Ok(None);
                }
                if !self.right.reset()? {
                    return Err(MinirelError::NotRestartable(self.right.name().to_string()));
                }
                continue;
            };
            let block = self.outer.block();
            while self.position < block.len() {
                let joined = block[self.position].join(inner);
                self.position += 1;
                if passes(&self.condition, &joined)? {
                    return Ok(Some(joined));
                }
            }
            self.inner = None;
        }
    }

    fn rewind(&mut self) -> MinirelResult<bool> {
        self.inner = None;
        self.position = 0;
        self.started = false;
        self.done = false;
        Ok(self.outer.reset()? && self.right.reset()?)
    }

    fn release(&mut self) {
        self.inner = None;
        self.done = true;
        self.outer.close();
        self.right.close();
    }

    fn name(&self) -> &'static str {
        "BlockNestedLoopJoin"
    }
}

//! Physical Operator Trait — Volcano Execution Model
//!
//! Operators are written as raw pull sources ([`TupleSource`]) and exposed
//! through the [`Lookahead`] adapter, which buffers one tuple ahead so every
//! operator gets an idempotent `peek` without computing a tuple twice.

use crate::error::MinirelResult;
use crate::types::{Header, Tuple};

/// 물리 연산자 트레이트 — Volcano 실행 모델 (Pull 기반)
pub trait PhysicalOperator: Send {
    /// 출력 스키마 반환
    fn header(&self) -> &Header;

    /// 다음 튜플 반환 (None이면 끝)
    fn next(&mut self) -> MinirelResult<Option<Tuple>>;

    /// Look at the next tuple without consuming it.
    fn peek(&mut self) -> MinirelResult<Option<&Tuple>>;

    fn has_next(&mut self) -> MinirelResult<bool> {
        Ok(self.peek()?.is_some())
    }

    /// 연산자 상태 초기화 (재실행용). `false` if the source cannot restart.
    fn reset(&mut self) -> MinirelResult<bool>;

    /// Release files and temporary runs, cascading to children.
    fn close(&mut self);

    /// Operator name for logs and error messages.
    fn name(&self) -> &'static str;
}

/// An operator whose output is sorted and addressable by position.
pub trait SortedOperator: PhysicalOperator {
    /// Reposition so the next tuple returned is the `index`-th of the stream.
    fn reset_to(&mut self, index: usize) -> MinirelResult<bool>;

    /// Position of the tuple most recently returned by `next`.
    fn last_index(&self) -> Option<usize>;

    /// Column positions the output is sorted on, most significant first.
    fn ordering(&self) -> &[usize];
}

/// Raw generator behind an operator. After returning `None` once, `fetch`
/// must keep returning `None` until `rewind`/`seek`.
pub trait TupleSource: Send {
    fn header(&self) -> &Header;

    fn fetch(&mut self) -> MinirelResult<Option<Tuple>>;

    fn rewind(&mut self) -> MinirelResult<bool>;

    fn release(&mut self);

    fn name(&self) -> &'static str;
}

/// A source that can jump to an absolute position.
pub trait SeekableSource: TupleSource {
    fn seek(&mut self, index: usize) -> MinirelResult<bool>;

    fn ordering(&self) -> &[usize];
}

/// Buffer-one-ahead adapter turning any [`TupleSource`] into an operator.
pub struct Lookahead<S> {
    source: S,
    buffered: Option<Tuple>,
    peeked: bool,
    /// Tuples returned by `next` since the last reset/seek origin.
    returned: usize,
}

impl<S: TupleSource> Lookahead<S> {
    pub fn wrap(source: S) -> Self {
        Self {
            source,
            buffered: None,
            peeked: false,
            returned: 0,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    fn clear(&mut self) {
        self.buffered = None;
        self.peeked = false;
    }
}

impl<S: TupleSource> PhysicalOperator for Lookahead<S> {
    fn header(&self) -> &Header {
        self.source.header()
    }

    fn next(&mut self) -> MinirelResult<Option<Tuple>> {
        let tuple = if self.peeked {
            self.peeked = false;
            self.buffered.take()
        } else {
            self.source.fetch()?
        };
        if tuple.is_some() {
            self.returned += 1;
        }
        Ok(tuple)
    }

    fn peek(&mut self) -> MinirelResult<Option<&Tuple>> {
        if !self.peeked {
            self.buffered = self.source.fetch()?;
            self.peeked = true;
        }
        Ok(self.buffered.as_ref())
    }

    fn reset(&mut self) -> MinirelResult<bool> {
        self.clear();
        self.returned = 0;
        self.source.rewind()
    }

    fn close(&mut self) {
        self.clear();
        self.source.release();
    }

    fn name(&self) -> &'static str {
        self.source.name()
    }
}

impl<S: SeekableSource> SortedOperator for Lookahead<S> {
    fn reset_to(&mut self, index: usize) -> MinirelResult<bool> {
        self.clear();
        self.returned = index;
        self.source.seek(index)
    }

    fn last_index(&self) -> Option<usize> {
        self.returned.checked_sub(1)
    }

    fn ordering(&self) -> &[usize] {
        self.source.ordering()
    }
}

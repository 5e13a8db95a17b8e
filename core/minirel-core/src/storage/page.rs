//! Page layout
//!
//! ```text
//! offset 0 : tuple width  (i32, big-endian)
//! offset 4 : tuple count  (i32, big-endian)
//! offset 8 : count × width packed i32 values
//! ...      : zero-filled to PAGE_SIZE
//! ```

use crate::error::{MinirelError, MinirelResult};
use crate::types::Tuple;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Size of every page on disk.
pub const PAGE_SIZE: usize = 4096;

/// Width + count fields.
pub const PAGE_HEADER_SIZE: usize = 8;

const INT_SIZE: usize = 4;

/// How many tuples of `width` integers fit on one page.
pub fn tuples_per_page(width: usize) -> usize {
    if width == 0 {
        return 0;
    }
    (PAGE_SIZE - PAGE_HEADER_SIZE) / (INT_SIZE * width)
}

/// Record id — physical location of a tuple, ordered by page then offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Rid {
    pub page_id: u32,
    pub tuple_id: u32,
}

impl Rid {
    pub fn new(page_id: u32, tuple_id: u32) -> Self {
        Self { page_id, tuple_id }
    }
}

impl fmt::Display for Rid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.page_id, self.tuple_id)
    }
}

#[inline]
pub(crate) fn read_i32(buf: &[u8], offset: usize) -> i32 {
    i32::from_be_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}

#[inline]
pub(crate) fn write_i32(buf: &mut [u8], offset: usize, value: i32) {
    buf[offset..offset + INT_SIZE].copy_from_slice(&value.to_be_bytes());
}

/// Serialize one page worth of tuples into `buf` (zero-filling the tail).
pub fn encode_page(width: usize, tuples: &[Tuple], buf: &mut [u8; PAGE_SIZE]) -> MinirelResult<()> {
    if tuples.len() > tuples_per_page(width) {
        return Err(MinirelError::Precondition(format!(
            "{} tuples of width {} do not fit in one page",
            tuples.len(),
            width
        )));
    }
    buf.fill(0);
    write_i32(buf, 0, width as i32);
    write_i32(buf, INT_SIZE, tuples.len() as i32);
    let mut offset = PAGE_HEADER_SIZE;
    for tuple in tuples {
        if tuple.width() != width {
            return Err(MinirelError::Schema(format!(
                "tuple of width {} written to page of width {}",
                tuple.width(),
                width
            )));
        }
        for &value in tuple.values() {
            write_i32(buf, offset, value);
            offset += INT_SIZE;
        }
    }
    Ok(())
}

/// Decode a page into `(width, tuples)`. Header values that cannot describe
/// a real page are reported as [`MinirelError::Index`] ("corrupt page").
pub fn decode_page(buf: &[u8; PAGE_SIZE]) -> MinirelResult<(usize, Vec<Tuple>)> {
    let width = read_i32(buf, 0);
    let count = read_i32(buf, INT_SIZE);
    if width <= 0 || count < 0 || count as usize > tuples_per_page(width as usize) {
        return Err(MinirelError::Index(format!(
            "corrupt page header: width={} count={}",
            width, count
        )));
    }
    let (width, count) = (width as usize, count as usize);
    let mut tuples = Vec::with_capacity(count);
    let mut offset = PAGE_HEADER_SIZE;
    for _ in 0..count {
        let mut values = Vec::with_capacity(width);
        for _ in 0..width {
            values.push(read_i32(buf, offset));
            offset += INT_SIZE;
        }
        tuples.push(Tuple::new(values));
    }
    Ok((width, tuples))
}

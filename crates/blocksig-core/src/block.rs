//! Block and digest records passed between pipeline stages, plus block math.

use std::ops::Range;

/// A contiguous slice of the input, identified by its position in read order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub index: u64,
    pub payload: Vec<u8>,
}

impl Block {
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Digest of one block as uppercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Digest {
    pub index: u64,
    pub hex: String,
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Block #{}: {}", self.index, self.hex)
    }
}

/// Number of blocks an input of `total_len` bytes splits into: `ceil(total_len / block_size)`.
/// Returns 0 for empty input or a zero block size.
pub fn block_count(total_len: u64, block_size: usize) -> u64 {
    if total_len == 0 || block_size == 0 {
        return 0;
    }
    total_len.div_ceil(block_size as u64)
}

/// Expected byte range of block `index`, or `None` past the end of input.
pub fn block_span(total_len: u64, block_size: usize, index: u64) -> Option<Range<u64>> {
    if index >= block_count(total_len, block_size) {
        return None;
    }
    let start = index.saturating_mul(block_size as u64);
    let end = start.saturating_add(block_size as u64).min(total_len);
    Some(start..end)
}

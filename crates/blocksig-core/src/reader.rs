//! Block reader: splits the input stream into indexed blocks.

use std::io::{self, Read};

use crate::block::Block;
use crate::buffer::BoundedBuffer;
use crate::control::CancellationSignal;
use crate::errors::{ErrorCollector, PipelineError};

/// What the reader produced before it stopped.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReadStats {
    pub blocks: u64,
    pub bytes: u64,
}

/// Read `source` into blocks of `block_size` bytes and push them into `blocks`.
///
/// Indices start at 0 and increase by one per block. Only the last block may be
/// shorter than `block_size`. A read failure is recorded and trips `signal`;
/// blocks already pushed stay in the buffer. Cancellation stops the reader
/// without recording anything.
pub fn read_blocks<R: Read>(
    mut source: R,
    block_size: usize,
    blocks: &BoundedBuffer<Block>,
    signal: &CancellationSignal,
    errors: &ErrorCollector,
) -> ReadStats {
    let mut stats = ReadStats::default();
    loop {
        if signal.is_cancelled() {
            break;
        }
        let payload = match fill_block(&mut source, block_size) {
            Ok(payload) if payload.is_empty() => break,
            Ok(payload) => payload,
            Err(e) => {
                errors.record(PipelineError::Read {
                    index: stats.blocks,
                    source: e,
                });
                signal.cancel();
                break;
            }
        };
        let len = payload.len();
        let block = Block {
            index: stats.blocks,
            payload,
        };
        if blocks.put(block).is_err() {
            tracing::debug!(next_index = stats.blocks, "reader cancelled");
            break;
        }
        stats.blocks += 1;
        stats.bytes += len as u64;
        if len < block_size {
            break;
        }
    }
    tracing::debug!(blocks = stats.blocks, bytes = stats.bytes, "reader finished");
    stats
}

/// Initial payload allocation; larger blocks grow as bytes actually arrive.
const INITIAL_BLOCK_CAPACITY: usize = 64 * 1024;

/// Read up to `block_size` bytes, retrying short reads until the block is
/// full or the stream ends. An empty result means end of stream.
fn fill_block<R: Read>(source: &mut R, block_size: usize) -> io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(block_size.min(INITIAL_BLOCK_CAPACITY));
    source.by_ref().take(block_size as u64).read_to_end(&mut buf)?;
    Ok(buf)
}

//! Hasher worker: turns blocks into digests.

use crate::block::{Block, Digest};
use crate::buffer::{BoundedBuffer, Take};
use crate::control::CancellationSignal;
use crate::digest::BlockDigester;
use crate::errors::{ErrorCollector, PipelineError};

/// Take blocks until the block buffer is drained or the run is cancelled,
/// pushing one digest per block into `results`. Returns the number of digests
/// pushed. A digest fault is recorded, trips `signal`, and ends this worker.
pub fn run_hasher(
    worker: usize,
    digester: &dyn BlockDigester,
    blocks: &BoundedBuffer<Block>,
    results: &BoundedBuffer<Digest>,
    signal: &CancellationSignal,
    errors: &ErrorCollector,
) -> u64 {
    let mut hashed = 0u64;
    loop {
        let block = match blocks.take() {
            Take::Item(block) => block,
            Take::Drained => break,
            Take::Cancelled => {
                tracing::debug!(worker, "hasher cancelled while waiting for a block");
                break;
            }
        };
        let hex = match digester.digest_hex(&block.payload) {
            Ok(hex) => hex,
            Err(fault) => {
                errors.record(PipelineError::Algorithm {
                    index: block.index,
                    reason: fault.to_string(),
                });
                signal.cancel();
                break;
            }
        };
        let digest = Digest {
            index: block.index,
            hex,
        };
        if results.put(digest).is_err() {
            tracing::debug!(worker, "hasher cancelled while publishing a digest");
            break;
        }
        hashed += 1;
    }
    tracing::debug!(worker, hashed, "hasher finished");
    hashed
}

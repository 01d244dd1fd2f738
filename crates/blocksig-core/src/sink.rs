//! Result sink: writes digests to the output stream as they arrive.

use std::io::Write;

use crate::block::Digest;
use crate::buffer::{BoundedBuffer, Take};
use crate::control::CancellationSignal;
use crate::errors::{ErrorCollector, PipelineError};

/// Write one `Block #{index}: {hex}` line per digest, in arrival order, until
/// `results` is drained or the run is cancelled. Returns the number of lines
/// written. A write failure is recorded and trips `signal`.
pub fn run_sink<W: Write>(
    mut out: W,
    results: &BoundedBuffer<Digest>,
    signal: &CancellationSignal,
    errors: &ErrorCollector,
) -> u64 {
    let mut written = 0u64;
    loop {
        let digest = match results.take() {
            Take::Item(digest) => digest,
            Take::Drained => break,
            Take::Cancelled => {
                tracing::debug!(written, "sink cancelled");
                break;
            }
        };
        if let Err(e) = writeln!(out, "{}", digest) {
            errors.record(PipelineError::Output(e));
            signal.cancel();
            return written;
        }
        written += 1;
    }
    if let Err(e) = out.flush() {
        errors.record(PipelineError::Output(e));
        signal.cancel();
    }
    tracing::debug!(written, "sink finished");
    written
}

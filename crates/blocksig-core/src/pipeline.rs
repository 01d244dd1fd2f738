//! Pipeline orchestration: reader -> hasher pool -> sink.
//!
//! The orchestrator opens the input, allocates both bounded buffers, starts
//! one reader thread, N hasher threads and one sink thread, then shuts them
//! down in order:
//!
//! 1. join the reader, close the block buffer, join every hasher;
//! 2. close the result buffer, join the sink;
//! 3. fold every captured failure into one `AggregateError`.
//!
//! A failing stage trips the shared cancellation signal so its siblings stop
//! promptly; threads are never killed, the drain sequence always runs to the end.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, ScopedJoinHandle};

use crate::block::{Block, Digest};
use crate::buffer::BoundedBuffer;
use crate::config::PipelineConfig;
use crate::control::CancellationSignal;
use crate::digest::{BlockDigester, Sha256Digester};
use crate::errors::{AggregateError, ErrorCollector, PipelineError};
use crate::hasher::run_hasher;
use crate::reader::{read_blocks, ReadStats};
use crate::sink::run_sink;

/// Lifecycle phases, logged as the run progresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Init,
    Running,
    DrainingBlocks,
    DrainingResults,
    Done,
    Failed,
}

/// Totals for a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub blocks: u64,
    pub bytes: u64,
    pub digests: u64,
    pub lines: u64,
    pub workers: usize,
}

/// A configured block signature pipeline. Reusable across runs.
#[derive(Clone)]
pub struct Pipeline {
    block_size: usize,
    workers: usize,
    block_capacity: usize,
    result_capacity: usize,
    digester: Arc<dyn BlockDigester>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("block_size", &self.block_size)
            .field("workers", &self.workers)
            .field("block_capacity", &self.block_capacity)
            .field("result_capacity", &self.result_capacity)
            .field("digester", &self.digester.name())
            .finish()
    }
}

impl Pipeline {
    /// Build a SHA-256 pipeline. Fails with a usage error if `block_size` is 0
    /// or the config is invalid; nothing is started in that case.
    pub fn new(block_size: usize, config: &PipelineConfig) -> Result<Self, PipelineError> {
        if block_size == 0 {
            return Err(PipelineError::Usage(
                "Block size should be a positive number".into(),
            ));
        }
        config.validate()?;
        Ok(Self {
            block_size,
            workers: config.effective_workers(),
            block_capacity: config.block_queue_capacity(),
            result_capacity: config.result_queue_capacity(),
            digester: Arc::new(Sha256Digester),
        })
    }

    /// Replace the digest implementation used by the hasher pool.
    pub fn with_digester(mut self, digester: Arc<dyn BlockDigester>) -> Self {
        self.digester = digester;
        self
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Open `path` and run the pipeline over it, writing result lines to `out`.
    pub fn run_path<W: Write + Send>(&self, path: &Path, out: W) -> Result<RunSummary, AggregateError> {
        tracing::debug!(state = ?PipelineState::Init, path = %path.display(), "opening input");
        let file = File::open(path).map_err(|source| {
            AggregateError::single(PipelineError::Open {
                path: path.to_path_buf(),
                source,
            })
        })?;
        self.run(file, out)
    }

    /// Run the pipeline over an already open `source`.
    pub fn run<R, W>(&self, source: R, out: W) -> Result<RunSummary, AggregateError>
    where
        R: Read + Send,
        W: Write + Send,
    {
        let signal = CancellationSignal::new();
        let errors = ErrorCollector::new();
        let blocks: Arc<BoundedBuffer<Block>> = BoundedBuffer::new(self.block_capacity, &signal);
        let results: Arc<BoundedBuffer<Digest>> = BoundedBuffer::new(self.result_capacity, &signal);

        tracing::debug!(
            state = ?PipelineState::Running,
            block_size = self.block_size,
            workers = self.workers,
            digester = self.digester.name(),
            "starting pipeline"
        );

        let (read, digests, lines) = thread::scope(|s| {
            let signal = &signal;
            let errors = &errors;
            let blocks = &*blocks;
            let results = &*results;
            let digester = &*self.digester;
            let block_size = self.block_size;

            let reader = s.spawn(move || {
                let _trip = signal.trip_on_panic();
                read_blocks(source, block_size, blocks, signal, errors)
            });
            let hashers: Vec<_> = (0..self.workers)
                .map(|worker| {
                    s.spawn(move || {
                        let _trip = signal.trip_on_panic();
                        run_hasher(worker, digester, blocks, results, signal, errors)
                    })
                })
                .collect();
            let sink = s.spawn(move || {
                let _trip = signal.trip_on_panic();
                run_sink(out, results, signal, errors)
            });

            tracing::debug!(state = ?PipelineState::DrainingBlocks, "waiting for reader");
            let read = join_stage("reader", reader, errors).unwrap_or_default();
            blocks.close();
            let digests: u64 = hashers
                .into_iter()
                .enumerate()
                .filter_map(|(worker, h)| join_stage(&format!("hasher-{}", worker), h, errors))
                .sum();

            tracing::debug!(state = ?PipelineState::DrainingResults, "waiting for sink");
            results.close();
            let lines = join_stage("sink", sink, errors).unwrap_or(0);
            (read, digests, lines)
        });

        if let Err(e) = errors.into_result() {
            tracing::warn!(state = ?PipelineState::Failed, errors = e.len(), "pipeline failed");
            return Err(e);
        }

        let summary = summarize(read, digests, lines, self.workers);
        tracing::info!(
            state = ?PipelineState::Done,
            blocks = summary.blocks,
            bytes = summary.bytes,
            workers = summary.workers,
            "pipeline completed"
        );
        Ok(summary)
    }
}

fn summarize(read: ReadStats, digests: u64, lines: u64, workers: usize) -> RunSummary {
    RunSummary {
        blocks: read.blocks,
        bytes: read.bytes,
        digests,
        lines,
        workers,
    }
}

/// Join a stage thread, recording a panic as a failure instead of propagating it.
fn join_stage<T>(role: &str, handle: ScopedJoinHandle<'_, T>, errors: &ErrorCollector) -> Option<T> {
    match handle.join() {
        Ok(value) => Some(value),
        Err(payload) => {
            errors.record(PipelineError::from_panic(role, payload));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::{sha256_upper_hex, DigestFault};
    use crate::errors::ErrorKind;

    fn config(workers: usize) -> PipelineConfig {
        PipelineConfig {
            workers: Some(workers),
            ..PipelineConfig::default()
        }
    }

    struct Panics;

    impl BlockDigester for Panics {
        fn name(&self) -> &'static str {
            "panics"
        }

        fn digest_hex(&self, _payload: &[u8]) -> Result<String, DigestFault> {
            panic!("digest blew up");
        }
    }

    #[test]
    fn zero_block_size_is_rejected() {
        let err = Pipeline::new(0, &config(2)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert_eq!(err.to_string(), "Block size should be a positive number");
    }

    #[test]
    fn invalid_config_is_rejected() {
        assert!(Pipeline::new(4, &config(0)).is_err());
    }

    #[test]
    fn ten_bytes_block_four_gives_three_lines() {
        let data: Vec<u8> = (0u8..10).collect();
        let pipeline = Pipeline::new(4, &config(3)).unwrap();
        let mut out = Vec::new();
        let summary = pipeline.run(&data[..], &mut out).unwrap();
        assert_eq!(
            summary,
            RunSummary {
                blocks: 3,
                bytes: 10,
                digests: 3,
                lines: 3,
                workers: 3,
            }
        );

        let text = String::from_utf8(out).unwrap();
        let mut lines: Vec<&str> = text.lines().collect();
        lines.sort();
        let expected = [
            format!("Block #0: {}", sha256_upper_hex(&data[0..4])),
            format!("Block #1: {}", sha256_upper_hex(&data[4..8])),
            format!("Block #2: {}", sha256_upper_hex(&data[8..10])),
        ];
        assert_eq!(lines, expected.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn empty_input_succeeds_without_output() {
        let pipeline = Pipeline::new(16, &config(2)).unwrap();
        let mut out = Vec::new();
        let summary = pipeline.run(std::io::empty(), &mut out).unwrap();
        assert_eq!(summary.blocks, 0);
        assert_eq!(summary.lines, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn missing_file_is_input_access_error() {
        let pipeline = Pipeline::new(16, &config(1)).unwrap();
        let err = pipeline
            .run_path(Path::new("/definitely/not/here.bin"), std::io::sink())
            .unwrap_err();
        assert_eq!(err.len(), 1);
        assert!(err.contains_kind(ErrorKind::InputAccess));
        assert!(err.to_string().starts_with("cannot open /definitely/not/here.bin"));
    }

    #[test]
    fn panicking_workers_are_reported_not_propagated() {
        let data = vec![7u8; 64];
        let pipeline = Pipeline::new(8, &config(2))
            .unwrap()
            .with_digester(Arc::new(Panics));
        let err = pipeline.run(&data[..], std::io::sink()).unwrap_err();
        assert!(err.contains_kind(ErrorKind::Panic));
        assert!(err.to_string().contains("digest blew up"));
    }

    #[test]
    fn debug_names_the_digester() {
        let pipeline = Pipeline::new(4, &config(1)).unwrap();
        let dbg = format!("{:?}", pipeline);
        assert!(dbg.contains("sha256"));
        assert_eq!(pipeline.block_size(), 4);
        assert_eq!(pipeline.workers(), 1);
    }
}

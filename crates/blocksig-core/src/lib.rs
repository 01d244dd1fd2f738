//! blocksig core: per-block SHA-256 signatures computed by a concurrent
//! reader -> hasher pool -> sink pipeline with bounded buffers, a shared
//! cancellation signal and aggregated error reporting.

pub mod config;
pub mod logging;

pub mod block;
pub mod buffer;
pub mod control;
pub mod digest;
pub mod errors;
pub mod hasher;
pub mod pipeline;
pub mod reader;
pub mod sink;

pub use block::{Block, Digest};
pub use config::PipelineConfig;
pub use digest::{BlockDigester, DigestFault, Sha256Digester};
pub use errors::{AggregateError, ErrorKind, PipelineError};
pub use pipeline::{Pipeline, RunSummary};

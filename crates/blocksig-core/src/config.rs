//! Pipeline tuning: worker count and buffer sizing, optionally from a TOML file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;

use crate::errors::PipelineError;

/// Pipeline tuning. Every field is optional in a TOML file; missing fields
/// take the built-in defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of hasher threads. `None` = available parallelism.
    pub workers: Option<usize>,
    /// Block buffer capacity per worker (raw payloads held in memory).
    pub block_queue_factor: usize,
    /// Result buffer capacity per worker (hex lines waiting for the sink).
    pub result_queue_factor: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: None,
            block_queue_factor: 2,
            result_queue_factor: 512,
        }
    }
}

impl PipelineConfig {
    /// Worker count actually used for a run.
    pub fn effective_workers(&self) -> usize {
        self.workers.unwrap_or_else(available_parallelism)
    }

    pub fn block_queue_capacity(&self) -> usize {
        self.effective_workers()
            .saturating_mul(self.block_queue_factor)
    }

    pub fn result_queue_capacity(&self) -> usize {
        self.effective_workers()
            .saturating_mul(self.result_queue_factor)
    }

    /// Reject values that would leave the pipeline without workers or buffer space.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.workers == Some(0) {
            return Err(PipelineError::Usage(
                "worker count should be a positive number".into(),
            ));
        }
        if self.block_queue_factor == 0 || self.result_queue_factor == 0 {
            return Err(PipelineError::Usage(
                "queue factors should be positive numbers".into(),
            ));
        }
        Ok(())
    }

    pub fn from_toml_str(data: &str) -> Result<Self> {
        let cfg: PipelineConfig = toml::from_str(data).context("invalid pipeline config")?;
        Ok(cfg)
    }

    /// Load a config file passed explicitly by the user. Nothing is read implicitly.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let cfg = Self::from_toml_str(&data)
            .with_context(|| format!("parse config {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded pipeline config");
        Ok(cfg)
    }
}

/// Available parallelism of this machine, at least 1.
pub fn available_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

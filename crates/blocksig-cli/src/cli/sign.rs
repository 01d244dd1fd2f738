//! Sign command: resolve config, run the pipeline, stream lines to stdout.

use anyhow::{Context, Result};
use blocksig_core::{Pipeline, PipelineConfig};
use std::io;

use super::Cli;

/// Effective pipeline config: the optional file first, then CLI overrides.
pub(super) fn resolve_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut cfg = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(workers) = cli.workers {
        cfg.workers = Some(workers);
    }
    tracing::debug!("resolved config: {:?}", cfg);
    Ok(cfg)
}

/// Run the pipeline over `cli.input`, writing `Block #i: HEX` lines to stdout.
pub(super) fn run_sign(cli: &Cli) -> Result<()> {
    let cfg = resolve_config(cli)?;
    let pipeline = Pipeline::new(cli.block_size, &cfg)?;
    tracing::info!(
        input = %cli.input.display(),
        block_size = cli.block_size,
        workers = pipeline.workers(),
        "signing file"
    );

    let summary = pipeline
        .run_path(&cli.input, io::stdout())
        .with_context(|| format!("signing {}", cli.input.display()))?;
    tracing::info!(
        blocks = summary.blocks,
        bytes = summary.bytes,
        "signed {}",
        cli.input.display()
    );
    Ok(())
}

//! CLI for the blocksig block signature tool.

mod sign;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use sign::run_sign;

/// Print a SHA-256 signature for every fixed-size block of a file.
#[derive(Debug, Parser)]
#[command(name = "blocksig")]
#[command(about = "Compute a SHA-256 digest for each block of a file", long_about = None)]
pub struct Cli {
    /// Path to the source file.
    #[arg(value_name = "SOURCE")]
    pub input: PathBuf,

    /// Block size in bytes (positive integer).
    #[arg(value_name = "BLOCK_SIZE", value_parser = parse_block_size, allow_hyphen_values = true)]
    pub block_size: usize,

    /// Number of hasher threads (default: available parallelism).
    #[arg(long, value_name = "N", value_parser = parse_workers)]
    pub workers: Option<usize>,

    /// Optional TOML file with pipeline tuning (workers, queue factors).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

fn parse_positive(s: &str) -> Option<usize> {
    s.trim().parse::<usize>().ok().filter(|n| *n > 0)
}

fn parse_block_size(s: &str) -> Result<usize, String> {
    parse_positive(s).ok_or_else(|| "Block size should be a positive number".to_string())
}

fn parse_workers(s: &str) -> Result<usize, String> {
    parse_positive(s).ok_or_else(|| "worker count should be a positive number".to_string())
}

/// Parse process arguments and run. Usage errors exit through clap before
/// any pipeline work starts.
pub fn run_from_args() -> Result<()> {
    let cli = Cli::parse();
    run_sign(&cli)
}

//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use mirror_fs::CompareMode;

/// Mirror - Keep a replica directory identical to a source directory
#[derive(Parser, Debug)]
#[command(name = "mirror")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to mirror (never modified)
    pub source: PathBuf,

    /// Directory kept identical to SOURCE
    pub replica: PathBuf,

    /// Seconds between two passes (positive whole number)
    #[arg(allow_hyphen_values = true)]
    pub interval: String,

    /// File the sync log is appended to
    pub log_path: PathBuf,

    /// How to decide whether a replica file is up to date
    #[arg(long, value_enum, default_value_t = CompareArg::Shallow, env = "MIRROR_COMPARE")]
    pub compare: CompareArg,

    /// Run a single pass and exit
    #[arg(long)]
    pub once: bool,

    /// Log what would change without touching the replica
    #[arg(long)]
    pub dry_run: bool,

    /// Print the pass report as JSON (requires --once)
    #[arg(long, requires = "once")]
    pub json: bool,

    /// Do not mirror the sync log to stdout
    #[arg(short, long)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// File comparison policies
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareArg {
    /// Same size and modification time
    Shallow,
    /// Same bytes
    Content,
}

impl From<CompareArg> for CompareMode {
    fn from(arg: CompareArg) -> Self {
        match arg {
            CompareArg::Shallow => CompareMode::Shallow,
            CompareArg::Content => CompareMode::Content,
        }
    }
}

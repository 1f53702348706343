//! Mirror CLI
//!
//! Periodically mirrors a source directory onto a replica directory.

mod cli;
mod commands;
mod error;

use std::io::{self, Write};

use clap::Parser;
use colored::Colorize;
use mirror_core::{Config, StopToken};
use tracing_subscriber::EnvFilter;

use cli::Cli;
use commands::RunOptions;
use error::Result;

fn main() {
    if let Err(e) = run() {
        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr, "{}: {}", "error".red().bold(), e);
        if e.is_usage() {
            let _ = writeln!(stderr, "Run {} for usage.", "mirror --help".cyan());
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::from_args(&cli.source, &cli.replica, &cli.interval, &cli.log_path)?
        .with_compare_mode(cli.compare.into());
    tracing::debug!(?config, "configuration validated");

    let options = RunOptions {
        dry_run: cli.dry_run,
        // JSON output owns stdout
        console: !(cli.quiet || cli.json),
    };
    let sync = commands::synchronizer(config, options);

    if cli.once {
        return commands::run_once(&sync, cli.json, &mut io::stdout());
    }

    let stop = StopToken::new();
    stop.register_signals()?;
    commands::run_forever(&sync, &stop, cli.quiet, &mut io::stdout())
}

/// Diagnostics go to stderr: `debug` with `--verbose`, otherwise `RUST_LOG`
/// or `warn`.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .try_init();
}

//! Single-pass and periodic run modes

use std::io::{self, Write};

use colored::Colorize;
use mirror_core::{Config, PassReport, StopToken, Synchronizer};

use crate::error::Result;

/// How the synchronizer should behave, from the command-line flags
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub dry_run: bool,
    /// Mirror sync log lines to stdout
    pub console: bool,
}

/// Build the synchronizer for `config`.
pub fn synchronizer(config: Config, options: RunOptions) -> Synchronizer {
    Synchronizer::new(config)
        .with_console(options.console)
        .with_dry_run(options.dry_run)
}

/// Run one pass and write its outcome to `out`.
///
/// With `json`, the [`PassReport`] is the only thing written to `out`.
///
/// # Errors
///
/// A failed pass, or an outcome that cannot be written. The replica is
/// already updated in the latter case.
pub fn run_once(sync: &Synchronizer, json: bool, out: &mut impl Write) -> Result<()> {
    let report = sync.run_pass(&StopToken::new())?;

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        write_summary(out, &report)?;
    }
    Ok(())
}

/// Run passes every interval until `stop` is set.
///
/// The banner and the closing line are best effort: an unwritable `out`
/// never stops the synchronizer.
pub fn run_forever(
    sync: &Synchronizer,
    stop: &StopToken,
    quiet: bool,
    out: &mut impl Write,
) -> Result<()> {
    let config = sync.config();
    if !quiet {
        let banner = writeln!(
            out,
            "{} Mirroring {} -> {} every {}s (Ctrl+C to stop)",
            "=>".blue().bold(),
            config.source().display().to_string().cyan(),
            config.replica().display().to_string().cyan(),
            config.interval().as_secs()
        );
        warn_unwritten(banner);
    }

    let passes = sync.start(stop)?;

    if !quiet {
        warn_unwritten(writeln!(
            out,
            "{} Stopped after {} passes.",
            "OK".green().bold(),
            passes
        ));
    }
    Ok(())
}

fn warn_unwritten(result: io::Result<()>) {
    if let Err(e) = result {
        tracing::warn!(error = %e, "could not write to stdout");
    }
}

fn write_summary(out: &mut impl Write, report: &PassReport) -> io::Result<()> {
    let verb = if report.dry_run { "Would apply" } else { "Applied" };
    if report.is_noop() {
        return writeln!(out, "{} Replica already in sync.", "OK".green().bold());
    }
    writeln!(
        out,
        "{} {} {} actions: {} files and {} directories copied, {} files and {} directories removed ({} bytes).",
        "OK".green().bold(),
        verb,
        report.action_count(),
        report.files_copied,
        report.directories_copied,
        report.files_removed,
        report.directories_removed,
        report.bytes_copied
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use mirror_test_utils::TreeFixture;
    use std::fs;

    fn config(fixture: &TreeFixture) -> Config {
        Config::from_args(fixture.source(), fixture.replica(), "10", fixture.log_path()).unwrap()
    }

    #[test]
    fn run_once_syncs_replica() {
        let fixture = TreeFixture::new();
        fixture.write_source("a/file1.txt", "hi");
        let sync = synchronizer(config(&fixture), RunOptions::default());

        run_once(&sync, false, &mut Vec::new()).unwrap();

        fixture.assert_replica_content("a/file1.txt", "hi");
    }

    #[test]
    fn run_once_dry_run_keeps_replica() {
        let fixture = TreeFixture::new();
        fixture.write_source("a.txt", "hi");
        let options = RunOptions {
            dry_run: true,
            console: false,
        };
        let sync = synchronizer(config(&fixture), options);

        let mut out = Vec::new();
        run_once(&sync, true, &mut out).unwrap();

        fixture.assert_replica_missing("a.txt");
        let report: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(report["dry_run"], true);
        let log = fs::read_to_string(fixture.log_path()).unwrap();
        assert!(log.contains("--- [dry-run] Copy of file source/a.txt"));
    }

    #[test]
    fn run_forever_returns_when_already_stopped() {
        let fixture = TreeFixture::new();
        let sync = synchronizer(config(&fixture), RunOptions::default());
        let stop = StopToken::new();
        stop.stop();

        run_forever(&sync, &stop, true, &mut Vec::new()).unwrap();

        let log = fs::read_to_string(fixture.log_path()).unwrap();
        assert_eq!(log, "- Synchronizer start (interval: 10s)\n");
    }

    #[test]
    fn run_once_reports_failure() {
        let fixture = TreeFixture::new();
        let sync = synchronizer(config(&fixture), RunOptions::default());
        fs::remove_dir_all(fixture.source()).unwrap();

        assert!(run_once(&sync, false, &mut Vec::new()).is_err());
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }
    }

    #[test]
    fn run_once_closed_output_is_an_error_after_syncing() {
        let fixture = TreeFixture::new();
        fixture.write_source("a.txt", "hi");
        let sync = synchronizer(config(&fixture), RunOptions::default());

        let result = run_once(&sync, false, &mut ClosedPipe);

        assert!(matches!(result, Err(CliError::Output(_))));
        fixture.assert_replica_content("a.txt", "hi");
    }

    #[test]
    fn run_forever_ignores_closed_output() {
        let fixture = TreeFixture::new();
        let sync = synchronizer(config(&fixture), RunOptions::default());
        let stop = StopToken::new();
        stop.stop();

        run_forever(&sync, &stop, false, &mut ClosedPipe).unwrap();

        let log = fs::read_to_string(fixture.log_path()).unwrap();
        assert_eq!(log, "- Synchronizer start (interval: 10s)\n");
    }

    #[test]
    fn summary_counts_actions() {
        let fixture = TreeFixture::new();
        fixture.write_source("a.txt", "hi");
        let options = RunOptions {
            dry_run: false,
            console: false,
        };
        let sync = synchronizer(config(&fixture), options);
        let mut out = Vec::new();

        run_once(&sync, false, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Applied 1 actions"), "got: {text}");
    }
}

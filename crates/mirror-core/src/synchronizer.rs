//! Pass runner for the configured roots
//!
//! The Synchronizer owns the configuration, the comparison policy, and the
//! sync log, and provides:
//! - **run_pass**: one reconciliation of the whole tree, logged
//! - **start**: the periodic loop, until a stop is requested

use chrono::Local;
use mirror_fs::Comparator;

use crate::config::Config;
use crate::event::SyncEvent;
use crate::logger::{EventSink, SyncLogger};
use crate::reconcile::{DirectoryPair, ReconcileOptions, TreeReconciler};
use crate::report::PassReport;
use crate::scheduler::Scheduler;
use crate::stop::StopToken;
use crate::Result;

/// Runs synchronization passes from the configured source onto the replica.
pub struct Synchronizer {
    config: Config,
    comparator: Box<dyn Comparator>,
    logger: SyncLogger,
    options: ReconcileOptions,
}

impl Synchronizer {
    /// Create a synchronizer using the configured comparison policy and log.
    pub fn new(config: Config) -> Self {
        Self {
            comparator: config.compare_mode().comparator(),
            logger: SyncLogger::new(config.log_path()),
            options: ReconcileOptions::default(),
            config,
        }
    }

    /// Enable or disable mirroring log lines to stdout (on by default).
    pub fn with_console(mut self, console: bool) -> Self {
        self.logger = self.logger.with_console(console);
        self
    }

    /// Plan actions without touching the replica.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.options.dry_run = dry_run;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run one pass over the whole tree.
    ///
    /// The sync log is held open for the duration of the pass and released
    /// on every exit path. A failed or interrupted pass is recorded in the
    /// log before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns the error that aborted the pass; [`Error::Cancelled`](crate::Error::Cancelled)
    /// if a stop was requested.
    pub fn run_pass(&self, stop: &StopToken) -> Result<PassReport> {
        let mut log = self.logger.open_pass()?;
        log.record_pass_start(Local::now())?;

        let pair = DirectoryPair::root(self.config.source(), self.config.replica());
        let mut reconciler =
            TreeReconciler::new(self.comparator.as_ref(), &mut log, stop).with_options(self.options);
        let outcome = reconciler.reconcile(&pair);
        let report = reconciler.into_report();

        match outcome {
            Ok(()) => {
                tracing::info!(
                    actions = report.action_count(),
                    bytes = report.bytes_copied,
                    "pass complete"
                );
                Ok(report)
            }
            Err(err) => {
                let event = if err.is_cancelled() {
                    SyncEvent::pass_interrupted(Local::now())
                } else {
                    SyncEvent::pass_failed(Local::now(), &err)
                };
                if let Err(log_err) = log.record(&event) {
                    tracing::warn!(error = %log_err, "could not record pass outcome");
                }
                Err(err)
            }
        }
    }

    /// Record the session start, then run a pass once per interval until
    /// `stop` is set.
    ///
    /// Pass failures are logged and retried at the next tick; they never end
    /// the loop. Returns the number of passes attempted.
    pub fn start(&self, stop: &StopToken) -> Result<u64> {
        self.logger.record_session_start(self.config.interval())?;

        let scheduler = Scheduler::new(self.config.interval());
        let passes = scheduler.run(stop, || match self.run_pass(stop) {
            Ok(report) => {
                tracing::debug!(actions = report.action_count(), "pass finished");
            }
            Err(err) if err.is_cancelled() => {
                tracing::info!("pass interrupted by stop request");
            }
            Err(err) => {
                tracing::error!(error = %err, "pass failed, retrying at next tick");
            }
        });
        Ok(passes)
    }
}

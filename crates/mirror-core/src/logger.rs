//! Sync log: append-only file sink mirrored to the console

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Local};
use fs2::FileExt;
use mirror_fs::LogicalPath;

use crate::event::{EventKind, SyncEvent};
use crate::{Error, Result};

/// Destination for sync events.
pub trait EventSink {
    /// Record one event. Must not buffer: once this returns, the event is
    /// handed to the operating system.
    fn record(&mut self, event: &SyncEvent) -> Result<()>;

    fn record_session_start(
        &mut self,
        timestamp: DateTime<Local>,
        interval: Duration,
    ) -> Result<()> {
        self.record(&SyncEvent::session_start(timestamp, interval))
    }

    fn record_pass_start(&mut self, timestamp: DateTime<Local>) -> Result<()> {
        self.record(&SyncEvent::pass_start(timestamp))
    }

    fn record_action(
        &mut self,
        timestamp: DateTime<Local>,
        kind: EventKind,
        path: &LogicalPath,
    ) -> Result<()> {
        self.record(&SyncEvent::action(timestamp, kind, path))
    }
}

/// The persistent sync log.
///
/// Holds only the destination; the file is opened per pass through
/// [`SyncLogger::open_pass`] and closed when the returned guard drops.
#[derive(Debug, Clone)]
pub struct SyncLogger {
    path: PathBuf,
    console: bool,
}

impl SyncLogger {
    /// Create a logger appending to `path`, mirroring lines to stdout.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            console: true,
        }
    }

    /// Enable or disable the stdout mirror.
    pub fn with_console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record the process start line.
    pub fn record_session_start(&self, interval: Duration) -> Result<()> {
        let mut log = self.open_pass()?;
        log.record_session_start(Local::now(), interval)
    }

    /// Open the log for one pass.
    ///
    /// The file is created if needed, opened for appending, and locked
    /// exclusively until the returned [`PassLog`] is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LogLocked`] if another process holds the lock and
    /// [`Error::Log`] for any other failure to open or lock the file.
    pub fn open_pass(&self) -> Result<PassLog> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| Error::Log {
                path: self.path.clone(),
                source,
            })?;

        FileExt::try_lock_exclusive(&file).map_err(|e| lock_error(&self.path, e))?;

        let console: Option<Box<dyn Write + Send>> = if self.console {
            Some(Box::new(io::stdout()))
        } else {
            None
        };
        Ok(PassLog {
            file,
            path: self.path.clone(),
            console,
        })
    }
}

fn lock_error(path: &Path, source: io::Error) -> Error {
    let contended = source.kind() == io::ErrorKind::WouldBlock
        || source.raw_os_error() == fs2::lock_contended_error().raw_os_error();
    if contended {
        Error::LogLocked {
            path: path.to_path_buf(),
        }
    } else {
        Error::Log {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// An open, locked sync log, released on drop.
pub struct PassLog {
    file: File,
    path: PathBuf,
    console: Option<Box<dyn Write + Send>>,
}

impl fmt::Debug for PassLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PassLog")
            .field("path", &self.path)
            .field("console", &self.console.is_some())
            .finish()
    }
}

impl EventSink for PassLog {
    fn record(&mut self, event: &SyncEvent) -> Result<()> {
        let line = event.to_line();
        writeln!(self.file, "{line}")
            .and_then(|()| self.file.flush())
            .map_err(|source| Error::Log {
                path: self.path.clone(),
                source,
            })?;

        // The file is the record; a closed stdout only ends the mirror
        if let Some(console) = self.console.as_mut() {
            if let Err(e) = writeln!(console, "{line}").and_then(|()| console.flush()) {
                tracing::warn!(error = %e, "console unavailable, sync log continues without it");
                self.console = None;
            }
        }
        tracing::debug!(kind = ?event.kind(), "{}", event.message());
        Ok(())
    }
}

impl Drop for PassLog {
    fn drop(&mut self) {
        // The handle closes right after; a failed unlock only delays release
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to unlock sync log");
        }
    }
}

/// In-memory sink collecting events, for reports and tests.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    events: Vec<SyncEvent>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[SyncEvent] {
        &self.events
    }

    /// Rendered lines, in recording order.
    pub fn lines(&self) -> Vec<String> {
        self.events.iter().map(SyncEvent::to_line).collect()
    }

    pub fn into_events(self) -> Vec<SyncEvent> {
        self.events
    }
}

impl EventSink for MemorySink {
    fn record(&mut self, event: &SyncEvent) -> Result<()> {
        self.events.push(event.clone());
        Ok(())
    }
}

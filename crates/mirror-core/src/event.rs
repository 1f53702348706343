//! Sync events and their log-line rendering

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Local};
use mirror_fs::LogicalPath;
use serde::Serialize;

/// Timestamp format of pass-start lines.
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y, %H:%M:%S";

/// Hierarchy level of an event, rendered as the line marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Process start
    Session,
    /// Start of one pass
    Pass,
    /// One action, or the outcome of a pass
    Action,
}

impl Tier {
    pub fn marker(self) -> &'static str {
        match self {
            Self::Session => "-",
            Self::Pass => "--",
            Self::Action => "---",
        }
    }
}

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    SessionStart,
    PassStart,
    FileCopied,
    DirectoryCopied,
    FileRemoved,
    DirectoryRemoved,
    PassFailed,
    PassInterrupted,
}

impl EventKind {
    pub fn tier(self) -> Tier {
        match self {
            Self::SessionStart => Tier::Session,
            Self::PassStart => Tier::Pass,
            _ => Tier::Action,
        }
    }

    /// Whether the event reports a change to the replica.
    pub fn is_mutation(self) -> bool {
        matches!(
            self,
            Self::FileCopied | Self::DirectoryCopied | Self::FileRemoved | Self::DirectoryRemoved
        )
    }

    fn describe(self) -> &'static str {
        match self {
            Self::SessionStart => "Synchronizer start",
            Self::PassStart => "Start update",
            Self::FileCopied => "Copy of file",
            Self::DirectoryCopied => "Copy of directory",
            Self::FileRemoved => "Removal of file",
            Self::DirectoryRemoved => "Removal of directory",
            Self::PassFailed => "Update failed",
            Self::PassInterrupted => "Update interrupted",
        }
    }
}

/// An immutable record of one event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncEvent {
    timestamp: DateTime<Local>,
    tier: Tier,
    kind: EventKind,
    message: String,
}

impl SyncEvent {
    fn new(timestamp: DateTime<Local>, kind: EventKind, message: String) -> Self {
        Self {
            timestamp,
            tier: kind.tier(),
            kind,
            message,
        }
    }

    pub fn session_start(timestamp: DateTime<Local>, interval: Duration) -> Self {
        let message = format!(
            "{} (interval: {}s)",
            EventKind::SessionStart.describe(),
            interval.as_secs()
        );
        Self::new(timestamp, EventKind::SessionStart, message)
    }

    pub fn pass_start(timestamp: DateTime<Local>) -> Self {
        let message = format!(
            "{}: {}",
            timestamp.format(TIMESTAMP_FORMAT),
            EventKind::PassStart.describe()
        );
        Self::new(timestamp, EventKind::PassStart, message)
    }

    /// A copy or removal applied to `path`.
    pub fn action(timestamp: DateTime<Local>, kind: EventKind, path: &LogicalPath) -> Self {
        Self::new(timestamp, kind, format!("{} {}", kind.describe(), path))
    }

    /// A copy or removal that a dry run would apply to `path`.
    pub fn planned(timestamp: DateTime<Local>, kind: EventKind, path: &LogicalPath) -> Self {
        Self::new(
            timestamp,
            kind,
            format!("[dry-run] {} {}", kind.describe(), path),
        )
    }

    pub fn pass_failed(timestamp: DateTime<Local>, error: &dyn fmt::Display) -> Self {
        let message = format!("{}: {}", EventKind::PassFailed.describe(), error);
        Self::new(timestamp, EventKind::PassFailed, message)
    }

    pub fn pass_interrupted(timestamp: DateTime<Local>) -> Self {
        let message = EventKind::PassInterrupted.describe().to_string();
        Self::new(timestamp, EventKind::PassInterrupted, message)
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Render as a single log line, without the trailing newline.
    pub fn to_line(&self) -> String {
        // Keep one event per line even if a path or error contains a newline
        let message = self.message.replace(['\r', '\n'], " ");
        format!("{} {}", self.tier.marker(), message)
    }
}

impl fmt::Display for SyncEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line())
    }
}

//! Outcome of one synchronization pass

use serde::Serialize;

use crate::event::{EventKind, SyncEvent};

/// Report from a pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PassReport {
    /// Whether the pass only planned its actions
    pub dry_run: bool,
    pub files_copied: u64,
    pub directories_copied: u64,
    pub files_removed: u64,
    pub directories_removed: u64,
    /// Bytes written into the replica
    pub bytes_copied: u64,
    /// Copy and removal events, in the order they happened
    pub actions: Vec<SyncEvent>,
}

impl PassReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    /// Count `event` and keep it in the action list.
    pub fn push(&mut self, event: SyncEvent) {
        match event.kind() {
            EventKind::FileCopied => self.files_copied += 1,
            EventKind::DirectoryCopied => self.directories_copied += 1,
            EventKind::FileRemoved => self.files_removed += 1,
            EventKind::DirectoryRemoved => self.directories_removed += 1,
            _ => return,
        }
        self.actions.push(event);
    }

    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// True when the replica was already in sync.
    pub fn is_noop(&self) -> bool {
        self.actions.is_empty()
    }
}

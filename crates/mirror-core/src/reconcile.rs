//! Recursive tree reconciliation
//!
//! [`TreeReconciler::reconcile`] makes one replica directory match one source
//! directory: missing or changed files are copied, missing directories are
//! copied whole, existing directories are descended into, and replica-only
//! entries are removed. Every copy or removal is recorded to an
//! [`EventSink`].

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use chrono::Local;
use mirror_fs::{
    Comparator, DescentGuard, Entry, EntryKind, LogicalPath, copy_file, copy_tree, list_replica,
    list_source, remove_entry,
};

use crate::event::{EventKind, SyncEvent};
use crate::logger::EventSink;
use crate::report::PassReport;
use crate::stop::StopToken;
use crate::{Error, Result};

/// Corresponding locations in the source and replica trees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryPair {
    pub source: PathBuf,
    pub replica: PathBuf,
    /// Display path of `source`, rooted at the source root's name
    pub logical_source: LogicalPath,
    /// Display path of `replica`, rooted at the replica root's name
    pub logical_replica: LogicalPath,
}

impl DirectoryPair {
    /// The pair of configured roots.
    pub fn root(source: impl Into<PathBuf>, replica: impl Into<PathBuf>) -> Self {
        let source = source.into();
        let replica = replica.into();
        Self {
            logical_source: LogicalPath::root(&source),
            logical_replica: LogicalPath::root(&replica),
            source,
            replica,
        }
    }

    /// The pair one level down, for the entry `name`.
    pub fn child(&self, name: &OsStr) -> Self {
        let display = name.to_string_lossy();
        Self {
            source: self.source.join(name),
            replica: self.replica.join(name),
            logical_source: self.logical_source.join(&display),
            logical_replica: self.logical_replica.join(&display),
        }
    }
}

/// Replica entries of one directory not yet matched by a source entry.
///
/// Whatever is left once all source entries are processed is removed.
#[derive(Debug, Default)]
pub struct ReplicaInventory {
    entries: BTreeMap<OsString, EntryKind>,
}

impl ReplicaInventory {
    pub fn from_entries(entries: impl IntoIterator<Item = Entry>) -> Self {
        Self {
            entries: entries.into_iter().map(|e| (e.name, e.kind)).collect(),
        }
    }

    /// Mark `name` as accounted for, returning the replica entry's kind.
    pub fn claim(&mut self, name: &OsStr) -> Option<EntryKind> {
        self.entries.remove(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The unclaimed entries, in name order.
    pub fn into_remaining(self) -> impl Iterator<Item = (OsString, EntryKind)> {
        self.entries.into_iter()
    }
}

/// Options for a reconciliation pass
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileOptions {
    /// If true, decide and record actions without touching the replica.
    /// Messages are prefixed with "[dry-run]".
    pub dry_run: bool,
}

/// Applies copy, recurse, and delete decisions to directory pairs.
pub struct TreeReconciler<'a> {
    comparator: &'a dyn Comparator,
    sink: &'a mut dyn EventSink,
    stop: &'a StopToken,
    options: ReconcileOptions,
    guard: DescentGuard,
    report: PassReport,
}

impl<'a> TreeReconciler<'a> {
    pub fn new(
        comparator: &'a dyn Comparator,
        sink: &'a mut dyn EventSink,
        stop: &'a StopToken,
    ) -> Self {
        Self {
            comparator,
            sink,
            stop,
            options: ReconcileOptions::default(),
            guard: DescentGuard::new(),
            report: PassReport::default(),
        }
    }

    pub fn with_options(mut self, options: ReconcileOptions) -> Self {
        self.options = options;
        self.report.dry_run = options.dry_run;
        self
    }

    pub fn into_report(self) -> PassReport {
        self.report
    }

    /// Make `pair.replica` match `pair.source`, recursively.
    ///
    /// Both directories must exist.
    ///
    /// # Errors
    ///
    /// Any listing, copy, removal, or log failure aborts the pass.
    /// [`Error::Cancelled`] is returned when a stop is requested between two
    /// entries.
    pub fn reconcile(&mut self, pair: &DirectoryPair) -> Result<()> {
        self.guard.enter(&pair.source)?;
        let result = self.reconcile_entries(pair);
        self.guard.leave();
        result
    }

    fn reconcile_entries(&mut self, pair: &DirectoryPair) -> Result<()> {
        self.check_stop()?;

        let source_entries = list_source(&pair.source)?;
        let mut inventory = ReplicaInventory::from_entries(list_replica(&pair.replica)?);

        for entry in &source_entries {
            self.check_stop()?;
            let replica_kind = inventory.claim(&entry.name);
            match entry.kind {
                EntryKind::Directory => self.sync_directory(pair, entry, replica_kind)?,
                EntryKind::File => self.sync_file(pair, entry, replica_kind)?,
                EntryKind::Other => {
                    tracing::debug!(
                        path = %pair.source.join(&entry.name).display(),
                        "skipping source entry that is neither file nor directory"
                    );
                }
            }
        }

        for (name, kind) in inventory.into_remaining() {
            self.check_stop()?;
            let child = pair.child(&name);
            self.remove(&child.replica, &child.logical_replica, kind)?;
        }

        Ok(())
    }

    fn sync_directory(
        &mut self,
        pair: &DirectoryPair,
        entry: &Entry,
        replica_kind: Option<EntryKind>,
    ) -> Result<()> {
        let child = pair.child(&entry.name);
        match replica_kind {
            Some(EntryKind::Directory) => return self.reconcile(&child),
            Some(kind) => {
                tracing::debug!(path = %child.logical_replica, "replica entry is not a directory");
                self.remove(&child.replica, &child.logical_replica, kind)?;
            }
            None => {}
        }

        if !self.options.dry_run {
            let stats = copy_tree(&child.source, &child.replica)?;
            self.report.bytes_copied += stats.bytes;
        }
        self.record(EventKind::DirectoryCopied, &child.logical_source)
    }

    fn sync_file(
        &mut self,
        pair: &DirectoryPair,
        entry: &Entry,
        replica_kind: Option<EntryKind>,
    ) -> Result<()> {
        let source = pair.source.join(&entry.name);
        let replica = pair.replica.join(&entry.name);
        let logical_source = pair.logical_source.join(&entry.name_lossy());

        match replica_kind {
            Some(EntryKind::File) if self.comparator.equivalent(&source, &replica) => {
                tracing::trace!(path = %logical_source, "unchanged");
                return Ok(());
            }
            Some(EntryKind::Directory) => {
                tracing::debug!(path = %logical_source, "replica entry is a directory");
                let logical_replica = pair.logical_replica.join(&entry.name_lossy());
                self.remove(&replica, &logical_replica, EntryKind::Directory)?;
            }
            _ => {}
        }

        if !self.options.dry_run {
            self.report.bytes_copied += copy_file(&source, &replica)?;
        }
        self.record(EventKind::FileCopied, &logical_source)
    }

    fn remove(&mut self, path: &Path, logical: &LogicalPath, kind: EntryKind) -> Result<()> {
        if !self.options.dry_run {
            remove_entry(path, kind)?;
        }
        let event = if kind.is_dir() {
            EventKind::DirectoryRemoved
        } else {
            EventKind::FileRemoved
        };
        self.record(event, logical)
    }

    fn record(&mut self, kind: EventKind, path: &LogicalPath) -> Result<()> {
        let event = if self.options.dry_run {
            SyncEvent::planned(Local::now(), kind, path)
        } else {
            SyncEvent::action(Local::now(), kind, path)
        };
        tracing::info!(kind = ?kind, path = %path, dry_run = self.options.dry_run, "replica updated");
        self.sink.record(&event)?;
        self.report.push(event);
        Ok(())
    }

    fn check_stop(&self) -> Result<()> {
        if self.stop.is_stopped() {
            return Err(Error::Cancelled);
        }
        Ok(())
    }
}

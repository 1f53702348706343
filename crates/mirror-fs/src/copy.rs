//! Metadata-preserving copy and removal primitives

use std::fs::{self, Metadata, Permissions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use filetime::{FileTime, set_file_times};

use crate::entry::{EntryKind, list_replica, list_source};
use crate::{Error, Result};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Counts of items materialized by [`copy_tree`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    pub files: u64,
    pub directories: u64,
    pub bytes: u64,
}

/// Tracks the canonical directories on the current descent path.
///
/// Entering a directory that is already on the path means a symbolic link
/// leads back into its own ancestry.
#[derive(Debug, Default)]
pub struct DescentGuard {
    stack: Vec<PathBuf>,
}

impl DescentGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push `dir` onto the descent path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SymlinkCycle`] if `dir` resolves to a directory that
    /// is already being descended.
    pub fn enter(&mut self, dir: &Path) -> Result<()> {
        let canonical = dunce::canonicalize(dir).map_err(|e| Error::io("resolve", dir, e))?;
        if self.stack.contains(&canonical) {
            return Err(Error::SymlinkCycle {
                path: dir.to_path_buf(),
            });
        }
        self.stack.push(canonical);
        Ok(())
    }

    /// Pop the innermost directory.
    pub fn leave(&mut self) {
        self.stack.pop();
    }
}

/// Copy a single file over `destination`, preserving permissions and times.
///
/// Content is written to a temporary file next to the destination and then
/// renamed into place, so the destination is never observed half-written.
/// An existing destination file (or link) is replaced, also inside a
/// read-only replica directory.
///
/// Returns the number of bytes copied.
pub fn copy_file(source: &Path, destination: &Path) -> Result<u64> {
    let metadata = fs::metadata(source).map_err(|e| Error::io("inspect", source, e))?;
    let copied = in_writable_parent(destination, || {
        copy_through_temp(source, destination, &metadata)
    })?;

    tracing::trace!(
        source = %source.display(),
        destination = %destination.display(),
        bytes = copied,
        "copied file"
    );
    Ok(copied)
}

fn copy_through_temp(source: &Path, destination: &Path, metadata: &Metadata) -> Result<u64> {
    // Fixed length, so a destination name at the filesystem limit still fits
    let temp_name = format!(
        ".mirror.{}.{}.tmp",
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    );
    let temp_path = destination.with_file_name(&temp_name);

    let copied = fs::copy(source, &temp_path)
        .and_then(|bytes| {
            apply_times(metadata, &temp_path)?;
            Ok(bytes)
        })
        .map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            Error::io("copy file", source, e)
        })?;

    fs::rename(&temp_path, destination).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        Error::io("replace", destination, e)
    })?;
    Ok(copied)
}

/// Copy a whole directory tree to `destination`, which must not exist yet.
///
/// Files, subdirectories, permission bits, and modification times are
/// reproduced. Source-side symbolic links are followed; entries that are
/// neither files nor directories are skipped.
pub fn copy_tree(source: &Path, destination: &Path) -> Result<TreeStats> {
    let mut stats = TreeStats::default();
    let mut guard = DescentGuard::new();
    copy_tree_inner(source, destination, &mut guard, &mut stats)?;
    Ok(stats)
}

fn copy_tree_inner(
    source: &Path,
    destination: &Path,
    guard: &mut DescentGuard,
    stats: &mut TreeStats,
) -> Result<()> {
    guard.enter(source)?;

    let metadata = fs::metadata(source).map_err(|e| Error::io("inspect", source, e))?;
    in_writable_parent(destination, || {
        fs::create_dir(destination).map_err(|e| Error::io("create directory", destination, e))
    })?;
    stats.directories += 1;

    for entry in list_source(source)? {
        let from = source.join(&entry.name);
        let to = destination.join(&entry.name);
        match entry.kind {
            EntryKind::Directory => copy_tree_inner(&from, &to, guard, stats)?,
            EntryKind::File => {
                stats.bytes += copy_file(&from, &to)?;
                stats.files += 1;
            }
            EntryKind::Other => {
                tracing::debug!(path = %from.display(), "skipping special entry");
            }
        }
    }

    // Children are in place: permissions and times last, so a read-only
    // directory can still be filled and its mtime is not bumped afterwards.
    apply_metadata(&metadata, destination)?;

    guard.leave();
    Ok(())
}

/// Remove a replica entry of the given kind.
///
/// Directories are removed with everything under them, read-only
/// subdirectories included. Links are removed themselves, never their
/// targets.
pub fn remove_entry(path: &Path, kind: EntryKind) -> Result<()> {
    in_writable_parent(path, || match kind {
        EntryKind::Directory => remove_tree(path),
        EntryKind::File | EntryKind::Other => {
            fs::remove_file(path).map_err(|e| Error::io("remove", path, e))
        }
    })
}

fn remove_tree(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            unlock_tree(path)?;
            fs::remove_dir_all(path).map_err(|e| Error::io("remove", path, e))
        }
        result => result.map_err(|e| Error::io("remove", path, e)),
    }
}

/// Give the owner full access to every directory under `dir`.
fn unlock_tree(dir: &Path) -> Result<()> {
    let mut permissions = fs::symlink_metadata(dir)
        .map_err(|e| Error::io("inspect", dir, e))?
        .permissions();
    set_owner_access(&mut permissions);
    fs::set_permissions(dir, permissions).map_err(|e| Error::io("unlock directory", dir, e))?;

    for entry in list_replica(dir)? {
        if entry.kind.is_dir() {
            unlock_tree(&dir.join(&entry.name))?;
        }
    }
    Ok(())
}

/// Run `op` on `entry`. If it is denied because the containing directory is
/// read-only, retry once with the directory made owner-writable, then put
/// the original mode back.
fn in_writable_parent<T>(entry: &Path, mut op: impl FnMut() -> Result<T>) -> Result<T> {
    let err = match op() {
        Err(err) if is_permission_denied(&err) => err,
        result => return result,
    };
    let Some(parent) = entry.parent() else {
        return Err(err);
    };
    let original = match fs::metadata(parent) {
        Ok(metadata) if is_read_only(&metadata.permissions()) => metadata.permissions(),
        _ => return Err(err),
    };

    let mut writable = original.clone();
    set_owner_access(&mut writable);
    if fs::set_permissions(parent, writable).is_err() {
        return Err(err);
    }
    tracing::debug!(dir = %parent.display(), "retrying in read-only directory");

    let result = op();
    let restored = fs::set_permissions(parent, original);
    let value = result?;
    restored.map_err(|e| Error::io("restore permissions", parent, e))?;
    Ok(value)
}

fn is_permission_denied(err: &Error) -> bool {
    matches!(err, Error::Io { source, .. } if source.kind() == io::ErrorKind::PermissionDenied)
}

#[cfg(unix)]
fn is_read_only(permissions: &Permissions) -> bool {
    use std::os::unix::fs::PermissionsExt;
    permissions.mode() & 0o200 == 0
}

#[cfg(not(unix))]
fn is_read_only(permissions: &Permissions) -> bool {
    permissions.readonly()
}

#[cfg(unix)]
fn set_owner_access(permissions: &mut Permissions) {
    use std::os::unix::fs::PermissionsExt;
    permissions.set_mode(permissions.mode() | 0o700);
}

#[cfg(not(unix))]
fn set_owner_access(permissions: &mut Permissions) {
    permissions.set_readonly(false);
}

fn apply_metadata(metadata: &Metadata, destination: &Path) -> Result<()> {
    fs::set_permissions(destination, metadata.permissions())
        .map_err(|e| Error::io("preserve permissions", destination, e))?;
    apply_times(metadata, destination).map_err(|e| Error::io("preserve times", destination, e))
}

fn apply_times(metadata: &Metadata, destination: &Path) -> io::Result<()> {
    let accessed = FileTime::from_last_access_time(metadata);
    let modified = FileTime::from_last_modification_time(metadata);
    set_file_times(destination, accessed, modified)
}

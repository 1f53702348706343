//! Directory listing for source and replica trees

use std::borrow::Cow;
use std::ffi::OsString;
use std::fs;
use std::path::Path;

use crate::{Error, Result};

/// Kind of a directory entry, as far as mirroring is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Regular file
    File,
    /// Directory
    Directory,
    /// Anything else: symlinks not followed, dangling links, sockets, fifos, devices
    Other,
}

impl EntryKind {
    fn of(file_type: fs::FileType) -> Self {
        if file_type.is_dir() {
            Self::Directory
        } else if file_type.is_file() {
            Self::File
        } else {
            Self::Other
        }
    }

    pub fn is_dir(self) -> bool {
        self == Self::Directory
    }
}

/// A single entry found directly under a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: OsString,
    pub kind: EntryKind,
}

impl Entry {
    /// The entry name for display and logical paths.
    pub fn name_lossy(&self) -> Cow<'_, str> {
        self.name.to_string_lossy()
    }
}

/// List a source directory, following symbolic links.
///
/// A link to a directory is reported as a directory and a link to a file as
/// a file. Dangling links are reported as [`EntryKind::Other`].
/// Entries are sorted by name.
pub fn list_source(dir: &Path) -> Result<Vec<Entry>> {
    list(dir, true)
}

/// List a replica directory without following symbolic links.
///
/// Links are reported as [`EntryKind::Other`] so they are replaced or
/// removed, never descended into. Entries are sorted by name.
pub fn list_replica(dir: &Path) -> Result<Vec<Entry>> {
    list(dir, false)
}

fn list(dir: &Path, follow_links: bool) -> Result<Vec<Entry>> {
    let read_dir = fs::read_dir(dir).map_err(|e| Error::io("list directory", dir, e))?;

    let mut entries = Vec::new();
    for dir_entry in read_dir {
        let dir_entry = dir_entry.map_err(|e| Error::io("list directory", dir, e))?;
        let file_type = dir_entry
            .file_type()
            .map_err(|e| Error::io("inspect", dir_entry.path(), e))?;

        let kind = if follow_links && file_type.is_symlink() {
            match fs::metadata(dir_entry.path()) {
                Ok(target) => EntryKind::of(target.file_type()),
                Err(_) => EntryKind::Other,
            }
        } else {
            EntryKind::of(file_type)
        };

        entries.push(Entry {
            name: dir_entry.file_name(),
            kind,
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn lists_sorted_with_kinds() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();
        fs::create_dir(dir.path().join("a")).unwrap();
        fs::write(dir.path().join("c.txt"), "c").unwrap();

        let entries = list_source(dir.path()).unwrap();
        let summary: Vec<_> = entries
            .iter()
            .map(|e| (e.name_lossy().into_owned(), e.kind))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("a".to_string(), EntryKind::Directory),
                ("b.txt".to_string(), EntryKind::File),
                ("c.txt".to_string(), EntryKind::File),
            ]
        );
    }

    #[test]
    fn listing_is_not_recursive() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b/c")).unwrap();
        fs::write(dir.path().join("a/b/c/deep.txt"), "x").unwrap();

        let entries = list_replica(dir.path()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, EntryKind::Directory);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let result = list_source(&dir.path().join("gone"));
        assert!(matches!(result, Err(Error::Io { op: "list directory", .. })));
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_followed_only_on_source_side() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("target")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("target"), dir.path().join("link")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("nowhere"), dir.path().join("dangling"))
            .unwrap();

        let kind_of = |entries: &[Entry], name: &str| {
            entries
                .iter()
                .find(|e| e.name == name)
                .map(|e| e.kind)
                .unwrap()
        };

        let source = list_source(dir.path()).unwrap();
        assert_eq!(kind_of(&source, "link"), EntryKind::Directory);
        assert_eq!(kind_of(&source, "dangling"), EntryKind::Other);

        let replica = list_replica(dir.path()).unwrap();
        assert_eq!(kind_of(&replica, "link"), EntryKind::Other);
        assert_eq!(kind_of(&replica, "target"), EntryKind::Directory);
    }
}

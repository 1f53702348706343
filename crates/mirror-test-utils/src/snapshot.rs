//! Whole-tree snapshots.
//!
//! A snapshot maps every relative path under a root to a [`Node`], so two
//! trees can be compared with a single `assert_eq!`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use filetime::FileTime;

/// What a snapshot records for one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Directory,
    File {
        content: Vec<u8>,
        /// Modification time as (seconds, nanoseconds)
        mtime: (i64, u32),
        readonly: bool,
    },
    Other,
}

/// Snapshot everything under `root`, keyed by `/`-separated relative path.
///
/// Links are not followed.
///
/// # Panics
/// Panics if any entry cannot be read.
pub fn snapshot_tree(root: &Path) -> BTreeMap<String, Node> {
    let mut nodes = BTreeMap::new();
    walk(root, "", &mut nodes);
    nodes
}

fn walk(dir: &Path, prefix: &str, nodes: &mut BTreeMap<String, Node>) {
    let entries = fs::read_dir(dir).unwrap_or_else(|e| panic!("read_dir {}: {e}", dir.display()));
    for entry in entries {
        let entry = entry.unwrap();
        let name = entry.file_name().to_string_lossy().into_owned();
        let key = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        };
        let path = entry.path();
        let metadata = fs::symlink_metadata(&path).unwrap();

        if metadata.is_dir() {
            nodes.insert(key.clone(), Node::Directory);
            walk(&path, &key, nodes);
        } else if metadata.is_file() {
            let mtime = FileTime::from_last_modification_time(&metadata);
            nodes.insert(
                key,
                Node::File {
                    content: fs::read(&path).unwrap(),
                    mtime: (mtime.unix_seconds(), mtime.nanoseconds()),
                    readonly: metadata.permissions().readonly(),
                },
            );
        } else {
            nodes.insert(key, Node::Other);
        }
    }
}

/// Assert that two trees hold the same entries, contents, mtimes, and
/// read-only flags.
pub fn assert_trees_match(expected: &Path, actual: &Path) {
    pretty_assertions::assert_eq!(snapshot_tree(expected), snapshot_tree(actual));
}

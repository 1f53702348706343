//! [`TreeFixture`] builder for mirror test scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use filetime::{FileTime, set_file_mtime};
use tempfile::TempDir;

/// A temporary workspace holding a `source` and a `replica` directory, plus
/// room for a log file, with helpers for setup and assertion.
///
/// # Example
///
/// ```rust,no_run
/// use mirror_test_utils::TreeFixture;
///
/// let fixture = TreeFixture::new();
/// fixture.write_source("a/file1.txt", "hi");
/// fixture.mkdir_replica("c");
/// fixture.assert_replica_missing("a/file1.txt");
/// ```
pub struct TreeFixture {
    temp_dir: TempDir,
    source: PathBuf,
    replica: PathBuf,
}

impl Default for TreeFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeFixture {
    /// Create empty `source/` and `replica/` directories in a fresh temp dir.
    ///
    /// # Panics
    /// Panics if the directories cannot be created.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("source");
        let replica = temp_dir.path().join("replica");
        fs::create_dir(&source).unwrap();
        fs::create_dir(&replica).unwrap();
        Self {
            temp_dir,
            source,
            replica,
        }
    }

    /// The temp directory holding both trees.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn replica(&self) -> &Path {
        &self.replica
    }

    /// Default log file location, next to (not inside) both trees.
    pub fn log_path(&self) -> PathBuf {
        self.root().join("sync.log")
    }

    /// Write `content` to `path` under the source tree, creating parents.
    pub fn write_source(&self, path: &str, content: &str) -> PathBuf {
        write(&self.source.join(path), content)
    }

    /// Write `content` to `path` under the replica tree, creating parents.
    pub fn write_replica(&self, path: &str, content: &str) -> PathBuf {
        write(&self.replica.join(path), content)
    }

    pub fn mkdir_source(&self, path: &str) -> PathBuf {
        mkdir(&self.source.join(path))
    }

    pub fn mkdir_replica(&self, path: &str) -> PathBuf {
        mkdir(&self.replica.join(path))
    }

    /// Set the modification time of a source entry to `secs` since the epoch.
    pub fn set_source_mtime(&self, path: &str, secs: i64) {
        set_mtime(&self.source.join(path), secs);
    }

    /// Set the modification time of a replica entry to `secs` since the epoch.
    pub fn set_replica_mtime(&self, path: &str, secs: i64) {
        set_mtime(&self.replica.join(path), secs);
    }

    /// Read a replica file as text.
    ///
    /// # Panics
    /// Panics if the file cannot be read.
    pub fn read_replica(&self, path: &str) -> String {
        let full_path = self.replica.join(path);
        fs::read_to_string(&full_path)
            .unwrap_or_else(|e| panic!("Could not read {}: {e}", full_path.display()))
    }

    /// Assert that `path` (relative to the replica root) exists.
    pub fn assert_replica_exists(&self, path: &str) {
        let full_path = self.replica.join(path);
        assert!(
            full_path.exists(),
            "Expected replica entry to exist: {}",
            full_path.display()
        );
    }

    /// Assert that `path` (relative to the replica root) does **not** exist.
    pub fn assert_replica_missing(&self, path: &str) {
        let full_path = self.replica.join(path);
        assert!(
            full_path.symlink_metadata().is_err(),
            "Expected replica entry NOT to exist: {}",
            full_path.display()
        );
    }

    /// Assert that the replica file at `path` holds exactly `content`.
    pub fn assert_replica_content(&self, path: &str, content: &str) {
        let actual = self.read_replica(path);
        assert_eq!(
            actual, content,
            "Replica file {path} has unexpected content"
        );
    }
}

fn write(path: &Path, content: &str) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .unwrap_or_else(|e| panic!("Could not create {}: {e}", parent.display()));
    }
    fs::write(path, content).unwrap_or_else(|e| panic!("Could not write {}: {e}", path.display()));
    path.to_path_buf()
}

fn mkdir(path: &Path) -> PathBuf {
    fs::create_dir_all(path).unwrap_or_else(|e| panic!("Could not create {}: {e}", path.display()));
    path.to_path_buf()
}

fn set_mtime(path: &Path, secs: i64) {
    set_file_mtime(path, FileTime::from_unix_time(secs, 0))
        .unwrap_or_else(|e| panic!("Could not set mtime of {}: {e}", path.display()));
}

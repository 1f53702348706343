//! Logical paths used in sync log messages

use std::path::Path;

/// A path relative to the parent of a configured root, for display.
///
/// The first segment is the root directory's own name, so a file `a/b.txt`
/// under a source root `/data/photos` is shown as `photos/a/b.txt`.
/// Segments are always joined with forward slashes, whatever the platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LogicalPath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl LogicalPath {
    /// Create a logical path from any path-like input.
    ///
    /// Converts backslashes to forward slashes for internal storage.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path_str = path.as_ref().to_string_lossy();
        let normalized = path_str.replace('\\', "/");
        Self { inner: normalized }
    }

    /// The logical path of a configured root: its final component.
    ///
    /// Falls back to the whole path for roots without a final component
    /// (`/`, `C:\`).
    pub fn root(dir: &Path) -> Self {
        match dir.file_name() {
            Some(name) => Self::new(name),
            None => Self::new(dir),
        }
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Join this path with a segment.
    pub fn join(&self, segment: &str) -> Self {
        let segment_normalized = segment.replace('\\', "/");
        let joined = if self.inner.is_empty() {
            segment_normalized
        } else if self.inner.ends_with('/') {
            format!("{}{}", self.inner, segment_normalized)
        } else {
            format!("{}/{}", self.inner, segment_normalized)
        };
        Self { inner: joined }
    }
}

impl AsRef<str> for LogicalPath {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}

impl std::fmt::Display for LogicalPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for LogicalPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for LogicalPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn root_uses_directory_name() {
        let root = LogicalPath::root(&PathBuf::from("/data/photos"));
        assert_eq!(root.as_str(), "photos");
    }

    #[test]
    fn root_without_name_keeps_full_path() {
        let root = LogicalPath::root(&PathBuf::from("/"));
        assert_eq!(root.as_str(), "/");
    }

    #[test]
    fn join_uses_forward_slashes() {
        let path = LogicalPath::from("src").join("a").join("file1.txt");
        assert_eq!(path.to_string(), "src/a/file1.txt");
    }

    #[test]
    fn join_normalizes_backslashes() {
        let path = LogicalPath::from(r"src\nested").join(r"a\b.txt");
        assert_eq!(path.as_str(), "src/nested/a/b.txt");
    }

    #[test]
    fn join_onto_trailing_slash() {
        let path = LogicalPath::from("/").join("etc");
        assert_eq!(path.as_str(), "/etc");
    }
}

//! Error types for mirror-fs

use std::path::PathBuf;

/// Result type for mirror-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in mirror-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to {op} {path}: {source}")]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Symbolic link cycle detected at {path}")]
    SymlinkCycle { path: PathBuf },
}

impl Error {
    pub fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }

    /// The path the failed operation was working on.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Io { path, .. } | Self::SymlinkCycle { path } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn io_error_display_names_operation_and_path() {
        let err = Error::io(
            "copy file",
            "/replica/a.txt",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        let display = err.to_string();
        assert!(display.contains("copy file"), "got: {display}");
        assert!(display.contains("/replica/a.txt"), "got: {display}");
        assert_eq!(err.path(), std::path::Path::new("/replica/a.txt"));
    }
}

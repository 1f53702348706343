//! Error types for mirror-core

use std::path::PathBuf;

/// Result type for mirror-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in mirror-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid startup configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Filesystem error from mirror-fs, aborts the current pass
    #[error(transparent)]
    Fs(#[from] mirror_fs::Error),

    /// The sync log could not be opened or written
    #[error("Failed to write sync log {path}: {source}")]
    Log {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Another process holds the sync log
    #[error("Sync log {path} is locked by another process")]
    LogLocked { path: PathBuf },

    /// A stop was requested while a pass was running
    #[error("Synchronization interrupted")]
    Cancelled,

    /// Signal handlers could not be installed
    #[error("Failed to install signal handlers: {0}")]
    Signal(#[source] std::io::Error),
}

impl Error {
    /// Whether this error is a requested stop rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Startup configuration failures. All of them are fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Source directory does not exist: {path}")]
    SourceMissing { path: PathBuf },

    #[error("Source path is not a directory: {path}")]
    SourceNotDirectory { path: PathBuf },

    #[error("Replica directory does not exist: {path}")]
    ReplicaMissing { path: PathBuf },

    #[error("Replica path is not a directory: {path}")]
    ReplicaNotDirectory { path: PathBuf },

    #[error("Source and replica must be different directories: {path}")]
    SamePath { path: PathBuf },

    #[error("Source and replica must not contain each other: {outer} contains {inner}")]
    NestedPaths { outer: PathBuf, inner: PathBuf },

    #[error("Interval must be a positive whole number of seconds, got '{value}'")]
    InvalidInterval { value: String },

    #[error("Log file directory does not exist: {path}")]
    LogDirectoryMissing { path: PathBuf },

    #[error("Log path must name a file, not a directory: {path}")]
    LogPathIsDirectory { path: PathBuf },

    #[error("Log file must not be inside the replica directory: {path}")]
    LogInsideReplica { path: PathBuf },

    #[error("Log file must not be inside the source directory: {path}")]
    LogInsideSource { path: PathBuf },

    #[error("Failed to resolve {path}: {source}")]
    Resolve {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

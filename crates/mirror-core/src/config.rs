//! Startup configuration and its validation

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use mirror_fs::CompareMode;

use crate::error::ConfigError;

/// Validated process configuration. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    source: PathBuf,
    replica: PathBuf,
    interval: Duration,
    log_path: PathBuf,
    compare_mode: CompareMode,
}

impl Config {
    /// Validate the four startup inputs.
    ///
    /// Roots and the log path are stored in canonical form.
    ///
    /// # Errors
    ///
    /// Returns the first failed check as a [`ConfigError`]:
    /// - source or replica missing, or not a directory
    /// - source and replica identical, or one inside the other
    /// - interval not a positive whole number of seconds
    /// - log directory missing, log path a directory, or log inside either tree
    pub fn from_args(
        source: impl AsRef<Path>,
        replica: impl AsRef<Path>,
        interval: &str,
        log_path: impl AsRef<Path>,
    ) -> Result<Self, ConfigError> {
        let source = source.as_ref();
        let replica = replica.as_ref();

        check_directory(source, true)?;
        check_directory(replica, false)?;

        let source = canonicalize(source)?;
        let replica = canonicalize(replica)?;
        if source == replica {
            return Err(ConfigError::SamePath { path: source });
        }
        if replica.starts_with(&source) {
            return Err(ConfigError::NestedPaths {
                outer: source,
                inner: replica,
            });
        }
        if source.starts_with(&replica) {
            return Err(ConfigError::NestedPaths {
                outer: replica,
                inner: source,
            });
        }

        let interval = parse_interval(interval)?;
        let log_path = resolve_log_path(log_path.as_ref(), &source, &replica)?;

        Ok(Self {
            source,
            replica,
            interval,
            log_path,
            compare_mode: CompareMode::default(),
        })
    }

    /// Select the comparison policy (shallow by default).
    pub fn with_compare_mode(mut self, compare_mode: CompareMode) -> Self {
        self.compare_mode = compare_mode;
        self
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn replica(&self) -> &Path {
        &self.replica
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn compare_mode(&self) -> CompareMode {
        self.compare_mode
    }
}

/// Parse a whole, positive number of seconds.
pub fn parse_interval(value: &str) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidInterval {
            value: value.to_string(),
        }),
    }
}

fn check_directory(path: &Path, is_source: bool) -> Result<(), ConfigError> {
    let path_buf = path.to_path_buf();
    match std::fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) if is_source => Err(ConfigError::SourceNotDirectory { path: path_buf }),
        Ok(_) => Err(ConfigError::ReplicaNotDirectory { path: path_buf }),
        Err(e) if e.kind() == io::ErrorKind::NotFound && is_source => {
            Err(ConfigError::SourceMissing { path: path_buf })
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(ConfigError::ReplicaMissing { path: path_buf })
        }
        Err(source) => Err(ConfigError::Resolve {
            path: path_buf,
            source,
        }),
    }
}

fn canonicalize(path: &Path) -> Result<PathBuf, ConfigError> {
    dunce::canonicalize(path).map_err(|source| ConfigError::Resolve {
        path: path.to_path_buf(),
        source,
    })
}

fn resolve_log_path(
    log_path: &Path,
    source: &Path,
    replica: &Path,
) -> Result<PathBuf, ConfigError> {
    if log_path.is_dir() {
        return Err(ConfigError::LogPathIsDirectory {
            path: log_path.to_path_buf(),
        });
    }
    let Some(file_name) = log_path.file_name() else {
        return Err(ConfigError::LogPathIsDirectory {
            path: log_path.to_path_buf(),
        });
    };

    // A bare file name lives in the current directory
    let parent = match log_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !parent.is_dir() {
        return Err(ConfigError::LogDirectoryMissing {
            path: parent.to_path_buf(),
        });
    }

    let parent = canonicalize(parent)?;
    if parent.starts_with(replica) {
        return Err(ConfigError::LogInsideReplica {
            path: log_path.to_path_buf(),
        });
    }
    // Every pass would copy the growing log into the replica
    if parent.starts_with(source) {
        return Err(ConfigError::LogInsideSource {
            path: log_path.to_path_buf(),
        });
    }
    Ok(parent.join(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("10", 10)]
    #[case(" 3 ", 3)]
    #[case("86400", 86_400)]
    #[case("18446744073709551615", u64::MAX)]
    fn parse_valid_interval(#[case] input: &str, #[case] secs: u64) {
        assert_eq!(parse_interval(input).unwrap(), Duration::from_secs(secs));
    }

    #[rstest]
    #[case("0")]
    #[case("-5")]
    #[case("1.5")]
    #[case("ten")]
    #[case("")]
    fn parse_invalid_interval(#[case] input: &str) {
        let err = parse_interval(input).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidInterval { value } if value == input));
    }
}

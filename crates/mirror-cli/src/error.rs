//! Error types for mirror-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Invalid command-line arguments
    #[error(transparent)]
    Config(#[from] mirror_core::ConfigError),

    /// Error from mirror-core
    #[error(transparent)]
    Core(#[from] mirror_core::Error),

    /// The pass report could not be serialized
    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),

    /// The outcome could not be written to stdout
    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

impl CliError {
    /// Whether the user should be pointed at `--help`.
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

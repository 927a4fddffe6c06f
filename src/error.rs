//! Error types for isqa

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, QaError>;

#[derive(Debug, Error)]
pub enum QaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    /// A persisted input the engine needs at startup does not exist.
    #[error("Required index file not found: {}", .0.display())]
    IndexMissing(PathBuf),

    #[error("Corrupt index: {0}")]
    IndexCorrupt(String),

    /// Caller mistake: unknown mode, zero result budget, empty question.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Unexpected failure caught at the engine boundary.
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Batch failed: {0}")]
    BatchFailed(String),
}

impl QaError {
    /// Stable machine-readable code used in robot-mode error output.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "io_error",
            Self::Sqlite(_) => "sqlite_error",
            Self::Json(_) => "json_error",
            Self::Config(_) | Self::MissingConfig(_) => "config_error",
            Self::IndexMissing(_) => "index_missing",
            Self::IndexCorrupt(_) => "index_corrupt",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Internal(_) => "internal_error",
            Self::BatchFailed(_) => "batch_failed",
        }
    }

    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidRequest(_))
    }
}

//! Error types for filesystem synchronization.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::error::ErrorCategory;

/// Errors raised by the filesystem primitives.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The copy source does not exist.
    #[error("Source does not exist: {0}")]
    SourceMissing(PathBuf),

    /// An I/O operation failed on a specific path.
    #[error("I/O error at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    /// The path has no usable file name (e.g. `/` or `..`).
    #[error("Path has no file name: {0}")]
    InvalidPath(PathBuf),
}

impl SyncError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SyncError::Io {
            path: path.into(),
            source,
        }
    }

    /// Map this error onto the shared taxonomy.
    pub fn category(&self) -> ErrorCategory {
        match self {
            SyncError::SourceMissing(_) | SyncError::InvalidPath(_) => {
                ErrorCategory::Configuration
            }
            SyncError::Io { .. } => ErrorCategory::Io,
        }
    }
}

/// Result type for filesystem primitives.
pub type SyncResult<T> = Result<T, SyncError>;

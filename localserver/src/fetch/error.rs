//! Error types for artifact fetching.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::ErrorCategory;

/// Errors that can occur while resolving or downloading a release artifact.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Version string could not be normalized.
    #[error("Invalid version '{0}'")]
    InvalidVersion(String),

    /// No release URL templates are configured.
    #[error("No release URLs configured (set [modpack] release_urls)")]
    NoReleaseSources,

    /// Server answered 404 for a single URL.
    #[error("Not found: {url}")]
    NotFound { url: String },

    /// Every candidate URL answered 404.
    #[error("Release {version} not found (tried: {})", tried.join(", "))]
    ArtifactNotFound { version: String, tried: Vec<String> },

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s: {url}")]
    Timeout { url: String, timeout_secs: u64 },

    /// Any other HTTP failure.
    #[error("HTTP error for {url}: {reason}")]
    Http { url: String, reason: String },

    /// Writing the downloaded bytes failed.
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            FetchError::InvalidVersion(_) | FetchError::NoReleaseSources => {
                ErrorCategory::Configuration
            }
            FetchError::Io { .. } => ErrorCategory::Io,
            _ => ErrorCategory::Network,
        }
    }
}

/// Result type for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;

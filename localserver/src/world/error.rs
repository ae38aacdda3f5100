//! Error types for remote world sync.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::ErrorCategory;
use crate::sync::SyncError;

/// Errors raised by world download and upload.
#[derive(Debug, Error)]
pub enum WorldSyncError {
    /// Required `[sync]` settings are missing.
    #[error("Remote sync not configured: {0}")]
    NotConfigured(String),

    /// A liveness marker is present in a local world that would be replaced.
    #[error("Server may be running: lock marker present in {0}")]
    ProcessMayBeRunning(PathBuf),

    /// The transfer tool could not be started.
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The transfer ran and failed.
    #[error("Transfer of {remote} failed: {reason}")]
    Transfer { remote: String, reason: String },

    /// Nothing local to upload.
    #[error("No local world to upload at {0}")]
    NothingToUpload(PathBuf),

    /// Staging or replacing a local folder failed.
    #[error(transparent)]
    Sync(#[from] SyncError),
}

impl WorldSyncError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            WorldSyncError::NotConfigured(_) | WorldSyncError::NothingToUpload(_) => {
                ErrorCategory::Configuration
            }
            WorldSyncError::ProcessMayBeRunning(_) => ErrorCategory::DataIntegrityRisk,
            WorldSyncError::Spawn { .. } | WorldSyncError::Transfer { .. } => {
                ErrorCategory::Network
            }
            WorldSyncError::Sync(e) => e.category(),
        }
    }
}

pub type WorldSyncResult<T> = Result<T, WorldSyncError>;

//! Error types for mode switching.

use std::path::PathBuf;
use thiserror::Error;

use super::EnvironmentMode;
use crate::error::ErrorCategory;
use crate::package::InstallError;
use crate::sync::SyncError;

/// Errors raised by the mode state manager.
#[derive(Debug, Error)]
pub enum ModeError {
    /// Name outside the closed mode set.
    #[error("Unknown mode '{0}' (expected test, production, fresh or vanilla)")]
    UnknownMode(String),

    /// The mode's configuration template does not exist.
    #[error("Configuration template not found: {0}")]
    TemplateMissing(PathBuf),

    /// A liveness marker suggests the server is using this world.
    #[error("Server may be running: lock marker present in {0}")]
    ProcessMayBeRunning(PathBuf),

    /// Filesystem failure before the mode was recorded. Nothing changed.
    #[error("Mode switch aborted: {0}")]
    Aborted(#[source] SyncError),

    /// The mode was recorded but the modpack configuration could not be
    /// copied in.
    #[error("Switched to {mode}, but syncing the modpack configuration failed: {source}")]
    ConfigStep {
        mode: EnvironmentMode,
        #[source]
        source: SyncError,
    },

    /// The mode was recorded but its world could not be prepared.
    #[error("Switched to {mode}, but preparing its world failed: {source}")]
    WorldStep {
        mode: EnvironmentMode,
        #[source]
        source: SyncError,
    },

    /// The mode was recorded but its mod set could not be prepared.
    #[error("Switched to {mode}, but preparing its mods failed: {reason}")]
    ModStep {
        mode: EnvironmentMode,
        reason: String,
        category: ErrorCategory,
    },

    /// Reset requested for a world that has no backup to reset from.
    #[error("No backup world at {0}; download one first")]
    NoBackup(PathBuf),

    /// The world is not one that may be deleted.
    #[error("The {mode} world is a {role} and cannot be deleted; use reset-local instead")]
    NotEphemeral { mode: EnvironmentMode, role: String },

    /// World deletion failed.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// The mode state file could not be read or written.
    #[error("Mode state file {path}: {reason}")]
    StateFile { path: PathBuf, reason: String },
}

impl ModeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ModeError::UnknownMode(_)
            | ModeError::TemplateMissing(_)
            | ModeError::NoBackup(_)
            | ModeError::NotEphemeral { .. } => ErrorCategory::Configuration,
            ModeError::ProcessMayBeRunning(_) => ErrorCategory::DataIntegrityRisk,
            ModeError::Aborted(e)
            | ModeError::ConfigStep { source: e, .. }
            | ModeError::WorldStep { source: e, .. }
            | ModeError::Sync(e) => e.category(),
            ModeError::ModStep { category, .. } => *category,
            ModeError::StateFile { .. } => ErrorCategory::Io,
        }
    }

    /// True when the mode is recorded and re-running the switch retries only
    /// the failed step.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ModeError::ConfigStep { .. } | ModeError::WorldStep { .. } | ModeError::ModStep { .. }
        )
    }

    pub(crate) fn mod_step(mode: EnvironmentMode, error: &InstallError) -> Self {
        ModeError::ModStep {
            mode,
            reason: error.to_string(),
            category: error.category(),
        }
    }
}

/// Result type for mode operations.
pub type ModeResult<T> = Result<T, ModeError>;

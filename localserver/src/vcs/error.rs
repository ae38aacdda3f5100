//! Error types for version checkout.

use std::path::PathBuf;
use thiserror::Error;

use super::state::CheckoutPhase;
use crate::error::ErrorCategory;

/// Failures reported by the version control collaborator.
#[derive(Debug, Error)]
pub enum VcsError {
    /// The tool could not be started.
    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool ran and reported failure.
    #[error("`{command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    /// Reapplying a shelf conflicted with the checked-out tree.
    #[error("Shelf {handle} conflicts with the working tree: {detail}")]
    RestoreConflict { handle: String, detail: String },

    /// The shelf entry no longer exists in the repository.
    #[error("Shelf {0} not found in repository")]
    ShelfNotFound(String),

    /// The directory is not a repository.
    #[error("Not a git repository: {0}")]
    NotARepository(PathBuf),
}

/// Result type for version control collaborator calls.
pub type VcsResult<T> = Result<T, VcsError>;

/// Errors raised by the version checkout manager.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The requested tag does not exist.
    #[error("Unknown revision '{requested}'")]
    UnknownRevision { requested: String },

    /// A non-default revision is already checked out, or a shelf is held.
    #[error("Already on {current}; return to the default branch first")]
    ShelfAlreadyOccupied { current: String },

    /// Checking out the target failed; the tree was returned to default.
    #[error("Checkout of {target} failed: {reason}")]
    CheckoutFailed { target: String, reason: String },

    /// Reapplying shelved changes conflicted. The shelf is retained.
    #[error("Shelved changes could not be reapplied: {detail}")]
    ShelfRestoreConflict { handle: String, detail: String },

    /// A previous run stopped mid-transition.
    #[error("Previous version switch to {target} was interrupted while {phase}")]
    InconsistentState { phase: CheckoutPhase, target: String },

    /// The collaborator failed outside of a checkout.
    #[error(transparent)]
    Vcs(#[from] VcsError),

    /// The state file could not be read or written.
    #[error("Checkout state file {path}: {reason}")]
    StateFile { path: PathBuf, reason: String },
}

impl CheckoutError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CheckoutError::StateFile { .. } => ErrorCategory::Io,
            _ => ErrorCategory::VersionControl,
        }
    }

    /// Operator hint printed beneath the error.
    pub fn remediation(&self) -> Option<String> {
        let hint = match self {
            CheckoutError::UnknownRevision { .. } => {
                "Run `localserver versions` to list available releases.".to_string()
            }
            CheckoutError::ShelfAlreadyOccupied { .. } => {
                "Run `localserver version default` first, then request the new version."
                    .to_string()
            }
            CheckoutError::CheckoutFailed { .. } => {
                "Check `git status` in the modpack repository; any shelved changes were \
                 reapplied if possible. Retry once the cause is fixed."
                    .to_string()
            }
            CheckoutError::ShelfRestoreConflict { handle, .. } => format!(
                "Your changes are kept in git stash entry {}. Resolve the conflict by hand \
                 (e.g. `git stash show -p {}`), then run `localserver version resolve`.",
                handle, handle
            ),
            CheckoutError::InconsistentState { .. } => {
                "Inspect the modpack repository with `git status` and `git stash list`, \
                 put it back on the default branch, then run `localserver version resolve`."
                    .to_string()
            }
            CheckoutError::Vcs(VcsError::NotARepository(_)) => {
                "Set [modpack] repo_dir in the config file to your modpack checkout.".to_string()
            }
            CheckoutError::Vcs(_) | CheckoutError::StateFile { .. } => return None,
        };
        Some(hint)
    }
}

/// Result type for checkout manager operations.
pub type CheckoutResult<T> = Result<T, CheckoutError>;

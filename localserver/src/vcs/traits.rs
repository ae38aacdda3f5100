//! Version control collaborator.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::VcsResult;

/// Identifies shelved changes held by the collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShelfHandle {
    /// Collaborator-specific id (a stash commit hash for git).
    pub id: String,
    pub message: String,
}

impl fmt::Display for ShelfHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// What HEAD points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revision {
    Tag(String),
    Branch(String),
    /// Detached at a commit with no tag.
    Commit(String),
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Revision::Tag(t) => write!(f, "tag {}", t),
            Revision::Branch(b) => write!(f, "branch {}", b),
            Revision::Commit(c) => write!(f, "commit {}", c),
        }
    }
}

/// Operations the checkout manager needs from a version control system.
///
/// The manager owns the legality rules (one shelf at most, tags validated
/// before checkout); implementations only execute.
pub trait VersionControl {
    /// All tags, in no particular order.
    fn list_tags(&self) -> VcsResult<Vec<String>>;

    /// Check out a tag or branch.
    fn checkout(&self, reference: &str) -> VcsResult<()>;

    /// Whether the working tree has local modifications.
    fn has_uncommitted_changes(&self) -> VcsResult<bool>;

    /// Set local modifications aside, leaving a clean tree.
    fn shelve(&self, message: &str) -> VcsResult<ShelfHandle>;

    /// Reapply and drop shelved modifications.
    ///
    /// On conflict, returns [`super::VcsError::RestoreConflict`] and keeps the
    /// shelved entry.
    fn restore_shelf(&self, handle: &ShelfHandle) -> VcsResult<()>;

    /// Current revision.
    fn current_revision(&self) -> VcsResult<Revision>;

    /// Up to `limit` short status lines describing local modifications.
    fn dirty_summary(&self, limit: usize) -> VcsResult<Vec<String>>;
}

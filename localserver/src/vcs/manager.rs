//! Version checkout state machine.
//!
//! ```text
//!   OnDefault --request_target--> Shelving --checkout ok--> OnTarget
//!       ^                             |                        |
//!       +------ checkout failed ------+                 request_default
//!       |                                                      v
//!       +---------------- restore ok / no shelf ---------- Restoring
//!                                                              |
//!                                     shelf conflict: stays Restoring
//!                                     until mark_resolved()
//! ```
//!
//! Every phase change is persisted before the collaborator is called, so an
//! interrupted run is detected by [`VersionCheckoutManager::open`].

use std::cmp::Ordering;
use std::path::PathBuf;

use tracing::{info, warn};

use super::state::{CheckoutPhase, CheckoutStateStore, VersionCheckoutState};
use super::traits::{Revision, VersionControl};
use super::{CheckoutError, CheckoutResult, VcsError};
use crate::fetch::VersionRef;
use crate::sync::remove_tree;

/// Number of status lines reported by [`VersionCheckoutManager::current`].
pub const DIRTY_SUMMARY_LINES: usize = 10;

/// Result of loading persisted state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupCheck {
    Consistent,
    /// A previous run stopped mid-transition. Requests are refused until
    /// [`VersionCheckoutManager::mark_resolved`].
    Inconsistent { phase: CheckoutPhase, target: String },
}

/// What a successful request did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// Moved to the target tag.
    SwitchedToTarget { tag: String, shelved: bool },
    /// Returned to the default branch.
    ReturnedToDefault { reapplied_shelf: bool },
    /// Nothing to do.
    AlreadyThere,
}

/// Current revision plus a short description of local changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionInfo {
    pub revision: Revision,
    pub dirty: Vec<String>,
}

/// Settings for the checkout manager.
#[derive(Debug, Clone)]
pub struct CheckoutOptions {
    pub default_branch: String,
    pub tag_prefix: String,
    /// Directory and file prefix of exported artifacts removed after every
    /// successful switch.
    pub artifact_cleanup: Option<(PathBuf, String)>,
}

/// Switches an external repository between its default branch and release
/// tags, shelving local changes on the way out and reapplying them on the
/// way back.
pub struct VersionCheckoutManager<V, S> {
    vcs: V,
    store: S,
    state: VersionCheckoutState,
    options: CheckoutOptions,
}

impl<V: VersionControl, S: CheckoutStateStore> VersionCheckoutManager<V, S> {
    /// Load persisted state and report whether it is consistent.
    pub fn open(
        vcs: V,
        store: S,
        options: CheckoutOptions,
    ) -> CheckoutResult<(Self, StartupCheck)> {
        let state = store.load()?.unwrap_or_default();
        let check = Self::check(&state);
        if let StartupCheck::Inconsistent { phase, target } = &check {
            warn!(phase = %phase, target = %target, "Interrupted version switch detected");
        }
        let manager = Self {
            vcs,
            store,
            state,
            options,
        };
        Ok((manager, check))
    }

    fn check(state: &VersionCheckoutState) -> StartupCheck {
        if state.phase.is_transient() {
            StartupCheck::Inconsistent {
                phase: state.phase,
                target: state.target.clone().unwrap_or_else(|| "?".to_string()),
            }
        } else {
            StartupCheck::Consistent
        }
    }

    pub fn state(&self) -> &VersionCheckoutState {
        &self.state
    }

    pub fn vcs(&self) -> &V {
        &self.vcs
    }

    /// Release tags, newest first.
    ///
    /// Only tags with the configured prefix are listed. Semantic versions sort
    /// descending; anything else follows, alphabetically.
    pub fn list_tags(&self) -> CheckoutResult<Vec<String>> {
        let prefix = &self.options.tag_prefix;
        let mut tags: Vec<(Option<semver::Version>, String)> = self
            .vcs
            .list_tags()?
            .into_iter()
            .filter(|t| t.starts_with(prefix.as_str()))
            .map(|t| {
                let parsed = semver::Version::parse(&t[prefix.len()..]).ok();
                (parsed, t)
            })
            .collect();

        tags.sort_by(|(va, ta), (vb, tb)| match (va, vb) {
            (Some(a), Some(b)) => b.cmp(a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => ta.cmp(tb),
        });
        Ok(tags.into_iter().map(|(_, t)| t).collect())
    }

    /// Current revision and the first status lines of local changes.
    pub fn current(&self) -> CheckoutResult<RevisionInfo> {
        Ok(RevisionInfo {
            revision: self.vcs.current_revision()?,
            dirty: self.vcs.dirty_summary(DIRTY_SUMMARY_LINES)?,
        })
    }

    /// Move to the release tag `requested` (with or without prefix).
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::InconsistentState`] after an interrupted run.
    /// - [`CheckoutError::ShelfAlreadyOccupied`] when a different tag is
    ///   already checked out or a shelf is held. Nothing is changed.
    /// - [`CheckoutError::UnknownRevision`] when the tag does not exist.
    ///   Nothing is changed.
    /// - [`CheckoutError::CheckoutFailed`] when the checkout itself failed;
    ///   shelved changes are reapplied on a best-effort basis and the state
    ///   returns to `OnDefault`.
    pub fn request_target(&mut self, requested: &str) -> CheckoutResult<CheckoutOutcome> {
        self.ensure_consistent()?;

        let version = VersionRef::parse(requested, &self.options.tag_prefix).map_err(|_| {
            CheckoutError::UnknownRevision {
                requested: requested.to_string(),
            }
        })?;
        let tag = version.tag().to_string();

        if self.state.phase == CheckoutPhase::OnTarget {
            if self.state.target.as_deref() == Some(tag.as_str()) {
                info!(tag = %tag, "Already on requested version");
                return Ok(CheckoutOutcome::AlreadyThere);
            }
            return Err(CheckoutError::ShelfAlreadyOccupied {
                current: self.state.target.clone().unwrap_or_default(),
            });
        }
        if let Some(handle) = self.state.shelf.peek() {
            return Err(CheckoutError::ShelfAlreadyOccupied {
                current: format!("default branch with shelved changes {}", handle),
            });
        }

        if !self.vcs.list_tags()?.iter().any(|t| t == &tag) {
            return Err(CheckoutError::UnknownRevision {
                requested: requested.to_string(),
            });
        }

        self.state.phase = CheckoutPhase::Shelving;
        self.state.target = Some(tag.clone());
        self.persist()?;

        let shelved = match self.shelve_if_dirty(&tag) {
            Ok(shelved) => shelved,
            Err(e) => {
                self.reset_to_default()?;
                return Err(e);
            }
        };

        if let Err(e) = self.vcs.checkout(&tag) {
            warn!(tag = %tag, error = %e, "Checkout failed, returning to default");
            self.recover_after_failed_checkout();
            self.reset_to_default()?;
            return Err(CheckoutError::CheckoutFailed {
                target: tag,
                reason: e.to_string(),
            });
        }

        self.state.phase = CheckoutPhase::OnTarget;
        self.persist()?;
        self.clean_artifacts();
        info!(tag = %tag, shelved, "Switched to release");
        Ok(CheckoutOutcome::SwitchedToTarget { tag, shelved })
    }

    /// Return to the default branch and reapply shelved changes.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::ShelfRestoreConflict`] when reapplying conflicts. The
    /// state stays `Restoring` with the shelf retained until
    /// [`Self::mark_resolved`].
    pub fn request_default(&mut self) -> CheckoutResult<CheckoutOutcome> {
        self.ensure_consistent()?;

        if self.state.phase == CheckoutPhase::OnDefault && self.state.shelf.is_empty() {
            return Ok(CheckoutOutcome::AlreadyThere);
        }

        let previous = self.state.phase;
        self.state.phase = CheckoutPhase::Restoring;
        self.persist()?;

        let branch = self.options.default_branch.clone();
        if let Err(e) = self.vcs.checkout(&branch) {
            self.state.phase = previous;
            self.persist()?;
            return Err(CheckoutError::CheckoutFailed {
                target: branch,
                reason: e.to_string(),
            });
        }

        let reapplied = match self.state.shelf.peek().cloned() {
            Some(handle) => match self.vcs.restore_shelf(&handle) {
                Ok(()) => {
                    self.state.shelf.pop();
                    true
                }
                Err(e) => {
                    warn!(
                        handle = %handle,
                        error = %e,
                        "Shelved changes conflict; leaving them for manual resolution"
                    );
                    let detail = match e {
                        VcsError::RestoreConflict { detail, .. } => detail,
                        other => other.to_string(),
                    };
                    return Err(CheckoutError::ShelfRestoreConflict {
                        handle: handle.id,
                        detail,
                    });
                }
            },
            None => false,
        };

        self.reset_to_default()?;
        self.clean_artifacts();
        info!(branch = %branch, reapplied, "Returned to default branch");
        Ok(CheckoutOutcome::ReturnedToDefault {
            reapplied_shelf: reapplied,
        })
    }

    /// Operator acknowledgement that the repository was fixed by hand.
    ///
    /// Drops the retained shelf entry (the collaborator's copy is untouched)
    /// and returns the state to `OnDefault`.
    pub fn mark_resolved(&mut self) -> CheckoutResult<()> {
        if let Some(handle) = self.state.shelf.pop() {
            info!(handle = %handle, "Forgetting shelf entry after manual resolution");
        }
        self.reset_to_default()
    }

    fn ensure_consistent(&self) -> CheckoutResult<()> {
        match Self::check(&self.state) {
            StartupCheck::Consistent => Ok(()),
            StartupCheck::Inconsistent { phase, target } => {
                Err(CheckoutError::InconsistentState { phase, target })
            }
        }
    }

    fn shelve_if_dirty(&mut self, tag: &str) -> CheckoutResult<bool> {
        if !self.vcs.has_uncommitted_changes()? {
            return Ok(false);
        }
        let message = format!("localserver auto-shelf before switching to {}", tag);
        let handle = self.vcs.shelve(&message)?;
        info!(handle = %handle, "Shelved local changes");
        if let Err(rejected) = self.state.shelf.push(handle) {
            return Err(CheckoutError::ShelfAlreadyOccupied {
                current: format!("shelf {}", rejected),
            });
        }
        self.persist()?;
        Ok(true)
    }

    /// Best effort: put shelved changes back after a failed checkout.
    fn recover_after_failed_checkout(&mut self) {
        let Some(handle) = self.state.shelf.peek().cloned() else {
            return;
        };
        match self.vcs.restore_shelf(&handle) {
            Ok(()) => {
                self.state.shelf.pop();
            }
            Err(e) => {
                warn!(
                    handle = %handle,
                    error = %e,
                    "Could not reapply shelved changes; they stay shelved"
                );
            }
        }
    }

    fn reset_to_default(&mut self) -> CheckoutResult<()> {
        self.state.phase = CheckoutPhase::OnDefault;
        self.state.target = None;
        self.persist()
    }

    fn persist(&self) -> CheckoutResult<()> {
        self.store.save(&self.state)
    }

    /// Remove exported artifacts so the next install cannot pick up one from
    /// another revision.
    fn clean_artifacts(&self) {
        let Some((dir, prefix)) = &self.options.artifact_cleanup else {
            return;
        };
        let result = remove_tree(dir, |p| {
            p.parent() == Some(dir.as_path())
                && p.file_name()
                    .map(|n| {
                        let n = n.to_string_lossy();
                        n.starts_with(prefix.as_str()) && n.ends_with(".mrpack")
                    })
                    .unwrap_or(false)
        });
        match result {
            Ok(summary) if summary.removed_count() > 0 => {
                info!(count = summary.removed_count(), "Removed stale exported artifacts");
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Could not clean exported artifacts"),
        }
    }
}

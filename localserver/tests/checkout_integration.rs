//! Integration tests for version checkout.
//!
//! These exercise [`VersionCheckoutManager`] with the JSON state store on
//! disk, re-opening the manager between steps the way separate CLI runs do:
//! - Clean visit to a release and back keeps the shelf empty throughout
//! - Dirty visit shelves and reapplies local changes
//! - A second target while on a target is refused without side effects
//! - A restore conflict survives a restart and is cleared by `mark_resolved`
//!
//! The last test drives a real `git` binary and is ignored by default.

use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::process::Command;
use std::rc::Rc;

use localserver::vcs::{
    CheckoutError, CheckoutOptions, CheckoutOutcome, CheckoutPhase, GitCli, JsonCheckoutStateStore,
    Revision, ShelfHandle, StartupCheck, VcsError, VcsResult, VersionCheckoutManager,
    VersionControl,
};
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

#[derive(Default)]
struct RepoState {
    head: String,
    dirty: bool,
    stash: Vec<ShelfHandle>,
    conflict_on_restore: bool,
    mutations: Vec<String>,
}

/// In-memory repository shared between manager instances.
#[derive(Clone)]
struct FakeRepo {
    tags: Vec<String>,
    state: Rc<RefCell<RepoState>>,
}

impl FakeRepo {
    fn new() -> Self {
        Self {
            tags: vec!["v0.9.48".into(), "v0.9.49".into(), "v0.9.50".into()],
            state: Rc::new(RefCell::new(RepoState {
                head: "main".to_string(),
                ..Default::default()
            })),
        }
    }

    fn mutations(&self) -> Vec<String> {
        self.state.borrow().mutations.clone()
    }
}

impl VersionControl for FakeRepo {
    fn list_tags(&self) -> VcsResult<Vec<String>> {
        Ok(self.tags.clone())
    }

    fn checkout(&self, reference: &str) -> VcsResult<()> {
        let mut state = self.state.borrow_mut();
        state.mutations.push(format!("checkout {}", reference));
        state.head = reference.to_string();
        Ok(())
    }

    fn has_uncommitted_changes(&self) -> VcsResult<bool> {
        Ok(self.state.borrow().dirty)
    }

    fn shelve(&self, message: &str) -> VcsResult<ShelfHandle> {
        let mut state = self.state.borrow_mut();
        state.mutations.push("shelve".to_string());
        let handle = ShelfHandle {
            id: format!("stash-{}", state.stash.len()),
            message: message.to_string(),
        };
        state.stash.push(handle.clone());
        state.dirty = false;
        Ok(handle)
    }

    fn restore_shelf(&self, handle: &ShelfHandle) -> VcsResult<()> {
        let mut state = self.state.borrow_mut();
        state.mutations.push(format!("restore {}", handle.id));
        if state.conflict_on_restore {
            return Err(VcsError::RestoreConflict {
                handle: handle.id.clone(),
                detail: "CONFLICT (content)".to_string(),
            });
        }
        state.stash.retain(|h| h != handle);
        state.dirty = true;
        Ok(())
    }

    fn current_revision(&self) -> VcsResult<Revision> {
        let head = self.state.borrow().head.clone();
        Ok(if self.tags.contains(&head) {
            Revision::Tag(head)
        } else {
            Revision::Branch(head)
        })
    }

    fn dirty_summary(&self, limit: usize) -> VcsResult<Vec<String>> {
        Ok(if self.state.borrow().dirty {
            vec![" M pack.toml".to_string()].into_iter().take(limit).collect()
        } else {
            Vec::new()
        })
    }
}

fn options() -> CheckoutOptions {
    CheckoutOptions {
        default_branch: "main".to_string(),
        tag_prefix: "v".to_string(),
        artifact_cleanup: None,
    }
}

fn open(
    repo: &FakeRepo,
    dir: &Path,
) -> (VersionCheckoutManager<FakeRepo, JsonCheckoutStateStore>, StartupCheck) {
    VersionCheckoutManager::open(repo.clone(), JsonCheckoutStateStore::in_dir(dir), options())
        .unwrap()
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn test_clean_visit_and_return_across_runs() {
    let temp = TempDir::new().unwrap();
    let repo = FakeRepo::new();

    let (mut manager, check) = open(&repo, temp.path());
    assert_eq!(check, StartupCheck::Consistent);
    assert_eq!(
        manager.request_target("0.9.50").unwrap(),
        CheckoutOutcome::SwitchedToTarget {
            tag: "v0.9.50".to_string(),
            shelved: false,
        }
    );
    assert!(manager.state().shelf.is_empty());

    let (mut manager, check) = open(&repo, temp.path());
    assert_eq!(check, StartupCheck::Consistent);
    assert_eq!(manager.state().phase, CheckoutPhase::OnTarget);
    assert_eq!(manager.state().target.as_deref(), Some("v0.9.50"));
    assert!(manager.state().shelf.is_empty());
    assert_eq!(
        manager.current().unwrap().revision,
        Revision::Tag("v0.9.50".to_string())
    );

    assert_eq!(
        manager.request_default().unwrap(),
        CheckoutOutcome::ReturnedToDefault {
            reapplied_shelf: false
        }
    );
    assert!(manager.state().shelf.is_empty());
    assert_eq!(repo.mutations(), vec!["checkout v0.9.50", "checkout main"]);
}

#[test]
fn test_dirty_visit_shelves_and_reapplies() {
    let temp = TempDir::new().unwrap();
    let repo = FakeRepo::new();
    repo.state.borrow_mut().dirty = true;

    let (mut manager, _) = open(&repo, temp.path());
    assert_eq!(
        manager.request_target("v0.9.49").unwrap(),
        CheckoutOutcome::SwitchedToTarget {
            tag: "v0.9.49".to_string(),
            shelved: true,
        }
    );
    assert_eq!(manager.state().shelf.len(), 1);

    let (mut manager, _) = open(&repo, temp.path());
    assert!(manager.state().shelved());
    manager.request_default().unwrap();

    assert!(!manager.state().shelved());
    assert!(repo.state.borrow().dirty);
    assert!(repo.state.borrow().stash.is_empty());
}

#[test]
fn test_second_target_refused_without_mutation() {
    let temp = TempDir::new().unwrap();
    let repo = FakeRepo::new();
    let (mut manager, _) = open(&repo, temp.path());
    manager.request_target("0.9.50").unwrap();
    let before = repo.mutations();

    let result = manager.request_target("0.9.48");

    assert!(matches!(
        result,
        Err(CheckoutError::ShelfAlreadyOccupied { ref current }) if current == "v0.9.50"
    ));
    assert_eq!(repo.mutations(), before);
    assert_eq!(manager.state().target.as_deref(), Some("v0.9.50"));
}

#[test]
fn test_unknown_tag_changes_nothing() {
    let temp = TempDir::new().unwrap();
    let repo = FakeRepo::new();
    let (mut manager, _) = open(&repo, temp.path());

    assert!(matches!(
        manager.request_target("1.0.0"),
        Err(CheckoutError::UnknownRevision { .. })
    ));
    assert!(repo.mutations().is_empty());
    assert_eq!(manager.state().phase, CheckoutPhase::OnDefault);
}

#[test]
fn test_restore_conflict_survives_restart() {
    let temp = TempDir::new().unwrap();
    let repo = FakeRepo::new();
    repo.state.borrow_mut().dirty = true;
    let (mut manager, _) = open(&repo, temp.path());
    manager.request_target("0.9.50").unwrap();
    repo.state.borrow_mut().conflict_on_restore = true;

    assert!(matches!(
        manager.request_default(),
        Err(CheckoutError::ShelfRestoreConflict { .. })
    ));

    let (mut manager, check) = open(&repo, temp.path());
    assert_eq!(
        check,
        StartupCheck::Inconsistent {
            phase: CheckoutPhase::Restoring,
            target: "v0.9.50".to_string(),
        }
    );
    assert!(matches!(
        manager.request_target("0.9.49"),
        Err(CheckoutError::InconsistentState { .. })
    ));

    manager.mark_resolved().unwrap();
    let (manager, check) = open(&repo, temp.path());
    assert_eq!(check, StartupCheck::Consistent);
    assert_eq!(manager.state().phase, CheckoutPhase::OnDefault);
    assert!(!manager.state().shelved());
    assert_eq!(repo.state.borrow().stash.len(), 1);
}

#[test]
fn test_list_tags_newest_first() {
    let temp = TempDir::new().unwrap();
    let (manager, _) = open(&FakeRepo::new(), temp.path());
    assert_eq!(
        manager.list_tags().unwrap(),
        vec!["v0.9.50", "v0.9.49", "v0.9.48"]
    );
}

// =============================================================================
// Real git
// =============================================================================

fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args(["-c", "user.name=test", "-c", "user.email=test@example.com"])
        .arg("-C")
        .arg(dir)
        .args(args)
        .status()
        .unwrap();
    assert!(status.success(), "git {:?} failed", args);
}

#[test]
#[ignore = "requires a git binary"]
fn test_real_git_round_trip_with_local_changes() {
    let temp = TempDir::new().unwrap();
    let repo = temp.path().join("MCC");
    fs::create_dir_all(&repo).unwrap();
    git(&repo, &["init", "-q", "-b", "main"]);
    fs::write(repo.join("pack.toml"), "version = \"0.9.50\"\n").unwrap();
    git(&repo, &["add", "."]);
    git(&repo, &["commit", "-q", "-m", "release"]);
    git(&repo, &["tag", "v0.9.50"]);
    fs::write(repo.join("pack.toml"), "version = \"0.9.51-dev\"\n").unwrap();
    git(&repo, &["commit", "-q", "-am", "dev"]);
    fs::write(repo.join("notes.txt"), "local edit\n").unwrap();

    let state_dir = temp.path().join("server");
    fs::create_dir_all(&state_dir).unwrap();
    let (mut manager, _) = VersionCheckoutManager::open(
        GitCli::open(&repo).unwrap(),
        JsonCheckoutStateStore::in_dir(&state_dir),
        options(),
    )
    .unwrap();

    let outcome = manager.request_target("0.9.50").unwrap();
    assert_eq!(
        outcome,
        CheckoutOutcome::SwitchedToTarget {
            tag: "v0.9.50".to_string(),
            shelved: true,
        }
    );
    assert_eq!(
        fs::read_to_string(repo.join("pack.toml")).unwrap(),
        "version = \"0.9.50\"\n"
    );
    assert!(!repo.join("notes.txt").exists());
    assert_eq!(
        manager.current().unwrap().revision,
        Revision::Tag("v0.9.50".to_string())
    );

    manager.request_default().unwrap();
    assert_eq!(
        fs::read_to_string(repo.join("notes.txt")).unwrap(),
        "local edit\n"
    );
    assert_eq!(
        manager.current().unwrap().revision,
        Revision::Branch("main".to_string())
    );
}

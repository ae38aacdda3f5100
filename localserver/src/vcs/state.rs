//! Persisted checkout state and the bounded shelf.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::traits::ShelfHandle;
use super::{CheckoutError, CheckoutResult};
use crate::sync::atomic_write;

/// State file name, stored in the server root.
pub const STATE_FILE_NAME: &str = "checkout-state.json";

/// Where the checkout state machine is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutPhase {
    #[default]
    OnDefault,
    Shelving,
    OnTarget,
    Restoring,
}

impl CheckoutPhase {
    /// Phases that are only ever persisted mid-transition.
    pub fn is_transient(self) -> bool {
        matches!(self, CheckoutPhase::Shelving | CheckoutPhase::Restoring)
    }
}

impl fmt::Display for CheckoutPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CheckoutPhase::OnDefault => "on default",
            CheckoutPhase::Shelving => "shelving",
            CheckoutPhase::OnTarget => "on target",
            CheckoutPhase::Restoring => "restoring",
        };
        f.write_str(name)
    }
}

/// A stack of shelved changes that holds at most one entry.
///
/// Nested shelving is refused here rather than left to the collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Shelf {
    slot: Option<ShelfHandle>,
}

impl Shelf {
    pub const CAPACITY: usize = 1;

    /// Push a handle. Fails, returning the handle, when already full.
    pub fn push(&mut self, handle: ShelfHandle) -> Result<(), ShelfHandle> {
        if self.slot.is_some() {
            return Err(handle);
        }
        self.slot = Some(handle);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<ShelfHandle> {
        self.slot.take()
    }

    pub fn peek(&self) -> Option<&ShelfHandle> {
        self.slot.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    pub fn len(&self) -> usize {
        usize::from(self.slot.is_some())
    }
}

/// Record of an in-progress or parked version switch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionCheckoutState {
    pub phase: CheckoutPhase,
    /// Tag being visited, if any.
    pub target: Option<String>,
    #[serde(default)]
    pub shelf: Shelf,
}

impl VersionCheckoutState {
    /// Whether local changes are currently set aside.
    pub fn shelved(&self) -> bool {
        !self.shelf.is_empty()
    }
}

/// Narrow accessor for the persisted checkout state.
pub trait CheckoutStateStore {
    /// Load state; `None` when nothing was ever saved.
    fn load(&self) -> CheckoutResult<Option<VersionCheckoutState>>;

    fn save(&self, state: &VersionCheckoutState) -> CheckoutResult<()>;
}

/// JSON file store.
#[derive(Debug, Clone)]
pub struct JsonCheckoutStateStore {
    path: PathBuf,
}

impl JsonCheckoutStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<server_root>/checkout-state.json`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(STATE_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn error(&self, reason: impl fmt::Display) -> CheckoutError {
        CheckoutError::StateFile {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}

impl CheckoutStateStore for JsonCheckoutStateStore {
    fn load(&self) -> CheckoutResult<Option<VersionCheckoutState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).map_err(|e| self.error(e))?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| self.error(e))
    }

    fn save(&self, state: &VersionCheckoutState) -> CheckoutResult<()> {
        let json = serde_json::to_vec_pretty(state).map_err(|e| self.error(e))?;
        atomic_write(&self.path, &json).map_err(|e| self.error(e))
    }
}

/// In-memory store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryCheckoutStateStore {
    state: Mutex<Option<VersionCheckoutState>>,
}

impl MemoryCheckoutStateStore {
    pub fn new(initial: Option<VersionCheckoutState>) -> Self {
        Self {
            state: Mutex::new(initial),
        }
    }

    /// Last saved state.
    pub fn snapshot(&self) -> Option<VersionCheckoutState> {
        self.state.lock().ok().and_then(|s| s.clone())
    }
}

impl CheckoutStateStore for MemoryCheckoutStateStore {
    fn load(&self) -> CheckoutResult<Option<VersionCheckoutState>> {
        Ok(self.snapshot())
    }

    fn save(&self, state: &VersionCheckoutState) -> CheckoutResult<()> {
        if let Ok(mut slot) = self.state.lock() {
            *slot = Some(state.clone());
        }
        Ok(())
    }
}

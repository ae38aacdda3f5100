//! Persisted record of the active mode.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{EnvironmentMode, ModeError, ModeResult};
use crate::sync::atomic_write;

/// State file name, stored in the server root.
pub const MODE_FILE_NAME: &str = ".localserver-mode";

/// Narrow accessor for the active mode record.
pub trait ModeStore: Send + Sync {
    /// The recorded mode, or `None` when nothing was recorded.
    fn load(&self) -> ModeResult<Option<EnvironmentMode>>;

    fn save(&self, mode: EnvironmentMode) -> ModeResult<()>;
}

/// Single-line text file holding the mode name.
#[derive(Debug, Clone)]
pub struct FileModeStore {
    path: PathBuf,
}

impl FileModeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(MODE_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn error(&self, reason: impl ToString) -> ModeError {
        ModeError::StateFile {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}

impl ModeStore for FileModeStore {
    fn load(&self) -> ModeResult<Option<EnvironmentMode>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).map_err(|e| self.error(e))?;
        let line = content.lines().next().unwrap_or("").trim();
        if line.is_empty() {
            return Ok(None);
        }
        line.parse().map(Some).map_err(|e: ModeError| self.error(e))
    }

    fn save(&self, mode: EnvironmentMode) -> ModeResult<()> {
        atomic_write(&self.path, format!("{}\n", mode).as_bytes()).map_err(|e| self.error(e))
    }
}

/// In-memory store for tests.
#[derive(Debug, Default)]
pub struct MemoryModeStore {
    mode: Mutex<Option<EnvironmentMode>>,
}

impl MemoryModeStore {
    pub fn new(initial: Option<EnvironmentMode>) -> Self {
        Self {
            mode: Mutex::new(initial),
        }
    }
}

impl ModeStore for MemoryModeStore {
    fn load(&self) -> ModeResult<Option<EnvironmentMode>> {
        Ok(self.mode.lock().ok().and_then(|m| *m))
    }

    fn save(&self, mode: EnvironmentMode) -> ModeResult<()> {
        if let Ok(mut slot) = self.mode.lock() {
            *slot = Some(mode);
        }
        Ok(())
    }
}

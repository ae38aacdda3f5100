//! Mod set inspection, pruning and the bootstrap auto-updater toggle.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use super::ModPolicy;
use crate::package::{InstallResult, InstallSummary};
use crate::sync::{remove_tree, RemoveSummary, SyncError, SyncResult};

/// Bootstrap jar that re-syncs mods on server start.
pub const UPDATER_JAR: &str = "packwiz-installer-bootstrap.jar";
/// Updater cache file.
pub const UPDATER_CACHE: &str = "packwiz.json";

const UPDATER_JAR_DISABLED_SUFFIX: &str = ".disabled";
const UPDATER_CACHE_BACKUP_SUFFIX: &str = ".backup";

/// Supplies the full mod set when a mode needs it.
pub trait ModProvisioner: Send + Sync {
    fn provision(&self) -> InstallResult<InstallSummary>;
}

/// Thresholds for [`ModPolicy`] checks.
#[derive(Debug, Clone)]
pub struct ModRules {
    /// Name fragment of the core dependency kept in every mode.
    pub protected_name: String,
    /// Jar count at which the full set counts as present.
    pub min_full_count: usize,
}

impl ModRules {
    pub fn is_protected(&self, path: &Path) -> bool {
        let needle = self.protected_name.to_lowercase();
        path.file_name()
            .map(|n| n.to_string_lossy().to_lowercase().contains(&needle))
            .unwrap_or(false)
    }

    /// Whether `mods_dir` already matches `policy`.
    ///
    /// `Full` is a bare count heuristic: any `min_full_count` jars satisfy it,
    /// whether or not they belong to the modpack.
    pub fn is_satisfied(&self, policy: ModPolicy, mods_dir: &Path) -> std::io::Result<bool> {
        let jars = list_jars(mods_dir)?;
        Ok(match policy {
            ModPolicy::Full => jars.len() >= self.min_full_count,
            ModPolicy::FabricApiOnly => {
                jars.len() == 1 && jars.iter().all(|j| self.is_protected(Path::new(j)))
            }
        })
    }

    /// Remove every jar and `.pw.toml` file except the protected one.
    pub fn prune_to_protected(&self, mods_dir: &Path) -> SyncResult<RemoveSummary> {
        remove_tree(mods_dir, |p| {
            p.parent() == Some(mods_dir) && is_mod_file(p) && !self.is_protected(p)
        })
    }
}

fn is_mod_file(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    name.ends_with(".jar") || name.ends_with(".pw.toml")
}

/// File names of `*.jar` directly in `mods_dir`. Missing directory is empty.
pub fn list_jars(mods_dir: &Path) -> std::io::Result<Vec<String>> {
    if !mods_dir.exists() {
        return Ok(Vec::new());
    }
    let mut jars = Vec::new();
    for entry in fs::read_dir(mods_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.to_lowercase().ends_with(".jar") && entry.path().is_file() {
            jars.push(name);
        }
    }
    jars.sort();
    Ok(jars)
}

/// Stop the bootstrap updater from re-downloading mods.
///
/// Returns true when anything was renamed.
pub fn disable_auto_updater(root: &Path) -> SyncResult<bool> {
    let jar = root.join(UPDATER_JAR);
    let jar_disabled = root.join(format!("{}{}", UPDATER_JAR, UPDATER_JAR_DISABLED_SUFFIX));
    let cache = root.join(UPDATER_CACHE);
    let cache_backup = root.join(format!("{}{}", UPDATER_CACHE, UPDATER_CACHE_BACKUP_SUFFIX));

    let mut changed = false;
    if jar.exists() {
        rename(&jar, &jar_disabled)?;
        changed = true;
    }
    if cache.exists() {
        rename(&cache, &cache_backup)?;
        changed = true;
    }
    if changed {
        info!("Disabled mod auto-updater");
    }
    Ok(changed)
}

/// Undo [`disable_auto_updater`].
///
/// When both the live and the set-aside copy exist the set-aside copy is
/// discarded.
pub fn restore_auto_updater(root: &Path) -> SyncResult<bool> {
    let pairs = [
        (
            root.join(format!("{}{}", UPDATER_JAR, UPDATER_JAR_DISABLED_SUFFIX)),
            root.join(UPDATER_JAR),
        ),
        (
            root.join(format!("{}{}", UPDATER_CACHE, UPDATER_CACHE_BACKUP_SUFFIX)),
            root.join(UPDATER_CACHE),
        ),
    ];

    let mut changed = false;
    for (aside, live) in &pairs {
        if !aside.exists() {
            continue;
        }
        if live.exists() {
            debug!(path = %aside.display(), "Discarding set-aside updater file");
            fs::remove_file(aside).map_err(|e| SyncError::io(aside, e))?;
        } else {
            rename(aside, live)?;
        }
        changed = true;
    }
    if changed {
        info!("Restored mod auto-updater");
    }
    Ok(changed)
}

/// Rename, replacing any existing `to`.
fn rename(from: &Path, to: &Path) -> SyncResult<()> {
    if to.exists() {
        fs::remove_file(to).map_err(|e| SyncError::io(to, e))?;
    }
    fs::rename(from, to).map_err(|e| SyncError::io(from, e))
}

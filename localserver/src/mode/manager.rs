//! Mode switching.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::environment::ACTIVE_PROPERTIES;
use super::mods::{
    disable_auto_updater, list_jars, restore_auto_updater, ModProvisioner, ModRules,
};
use super::pack_config::{sync_pack_config, CONFIG_DIR};
use super::{
    EnvironmentMode, ModPolicy, ModeError, ModeResult, ModeStore, WorldDataSet, WorldRole,
};
use crate::error::ErrorCategory;
use crate::package::{InstallError, InstallSummary, MODS_DIR};
use crate::server::{setup_auto_op, AutoOpSetup};
use crate::sync::{
    atomic_copy, backup_then_replace, copy_tree, dir_stats, liveness, DirStats, RemoveSummary,
    SyncError, SyncResult,
};

/// Caller choices for a switch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwitchOptions {
    /// Rebuild the target's world: re-copy a working copy from its backup
    /// (keeping the old copy under a timestamped name) or delete an
    /// ephemeral world.
    pub reset: bool,
    /// Proceed even though a liveness marker is present.
    pub force: bool,
}

/// What happened to the target's world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorldAction {
    /// Working copy created from the backup.
    CopiedFromBackup { files: u64 },
    /// Existing world left untouched.
    KeptExisting,
    /// Working copy replaced from the backup; the old copies were kept.
    ResetFromBackup { backups: Vec<PathBuf> },
    /// Neither backup nor working copy exists; the server will generate one.
    NoBackup,
    /// No world yet; the server will generate one.
    Generated,
}

/// What happened to the mods directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModAction {
    AlreadySatisfied,
    Installed(InstallSummary),
    /// Number of files removed.
    Pruned(usize),
}

/// Outcome of a successful switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchReport {
    pub mode: EnvironmentMode,
    pub previous: Option<EnvironmentMode>,
    /// Template copied over the active configuration.
    pub template: PathBuf,
    /// Modpack config items copied into the server, when the mode syncs them.
    pub configs_synced: Option<usize>,
    pub world: WorldAction,
    pub mods: ModAction,
    /// Whether the auto-updater was disabled or restored.
    pub updater_toggled: bool,
    /// Advisory conditions the operator should see.
    pub warnings: Vec<String>,
}

/// Presence and size of one world group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldStatus {
    pub world: WorldDataSet,
    pub present: bool,
    pub stats: DirStats,
    /// A liveness marker was found in one of its dimensions.
    pub live: bool,
}

/// Snapshot for `status` displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub active: Option<EnvironmentMode>,
    pub worlds: Vec<WorldStatus>,
    pub mod_count: usize,
}

/// What [`ModeStateManager::prepare_start`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartPreparation {
    pub mode: Option<EnvironmentMode>,
    /// Permissions setup, for modes that carry the full mod set.
    pub auto_op: Option<AutoOpSetup>,
    /// `None` when the mod set was not checked.
    pub mods: Option<ModAction>,
    pub warnings: Vec<String>,
}

/// Top-level orchestrator: tracks the active mode and moves the server
/// directory between modes.
pub struct ModeStateManager {
    root: PathBuf,
    store: Box<dyn ModeStore>,
    provisioner: Box<dyn ModProvisioner>,
    rules: ModRules,
    pack_config: Option<PathBuf>,
}

impl ModeStateManager {
    pub fn new(
        root: impl Into<PathBuf>,
        store: Box<dyn ModeStore>,
        provisioner: Box<dyn ModProvisioner>,
        rules: ModRules,
    ) -> Self {
        Self {
            root: root.into(),
            store,
            provisioner,
            rules,
            pack_config: None,
        }
    }

    /// Modpack `config/` directory copied into the server by modes that
    /// sync it.
    pub fn with_pack_config(mut self, dir: impl Into<PathBuf>) -> Self {
        self.pack_config = Some(dir.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn mods_dir(&self) -> PathBuf {
        self.root.join(MODS_DIR)
    }

    /// The recorded mode, or the one inferred from `level-name` in the active
    /// configuration when nothing was recorded.
    pub fn active_mode(&self) -> ModeResult<Option<EnvironmentMode>> {
        if let Some(mode) = self.store.load()? {
            return Ok(Some(mode));
        }
        Ok(self.infer_mode())
    }

    fn infer_mode(&self) -> Option<EnvironmentMode> {
        let content = fs::read_to_string(self.root.join(ACTIVE_PROPERTIES)).ok()?;
        content
            .lines()
            .find_map(|l| l.trim().strip_prefix("level-name="))
            .and_then(EnvironmentMode::from_level_name)
    }

    /// Switch the server directory to `target`.
    ///
    /// Steps, in order: liveness check, template copy, modpack config sync
    /// (production only), world reconcile, mod reconcile, record. A failure
    /// before the template is in place changes nothing. Config, world or mod
    /// failures still record `target` and return a recoverable error;
    /// re-running the switch retries them.
    pub fn switch_mode(
        &self,
        target: EnvironmentMode,
        options: SwitchOptions,
    ) -> ModeResult<SwitchReport> {
        let previous = self.active_mode()?;
        let mut warnings = Vec::new();

        let mut watched: Vec<WorldDataSet> = previous.iter().map(|m| m.world()).collect();
        watched.push(target.world());
        self.check_liveness(&watched, options.force, &mut warnings)?;

        let template = self.root.join(target.template_name());
        if !template.is_file() {
            return Err(ModeError::TemplateMissing(template));
        }
        atomic_copy(&template, &self.root.join(ACTIVE_PROPERTIES)).map_err(ModeError::Aborted)?;
        info!(mode = %target, template = %template.display(), "Applied configuration template");

        let configs = self.sync_configs(target, &mut warnings);
        let world = self.reconcile_world(target, options.reset, &mut warnings);
        let updater = self.toggle_updater(target.mod_policy());
        let mods = self.reconcile_mods(target, &mut warnings);

        self.store.save(target)?;
        info!(mode = %target, "Recorded active mode");
        for w in &warnings {
            warn!(mode = %target, "{}", w);
        }

        let configs_synced = configs.map_err(|source| ModeError::ConfigStep {
            mode: target,
            source,
        })?;
        let world = world.map_err(|source| ModeError::WorldStep {
            mode: target,
            source,
        })?;
        let updater_toggled = updater
            .map_err(|e| ModeError::mod_step(target, &InstallError::from(e)))?;
        let mods = mods?;

        Ok(SwitchReport {
            mode: target,
            previous,
            template,
            configs_synced,
            world,
            mods,
            updater_toggled,
            warnings,
        })
    }

    /// Get the server directory ready for a start in the active mode.
    ///
    /// Modes with the full mod set get LuckPerms auto-op configured and
    /// their mods provisioned when fewer than the configured minimum are
    /// present. A failed provision is a recoverable [`ModeError::ModStep`];
    /// the caller decides whether to start anyway.
    pub fn prepare_start(&self) -> ModeResult<StartPreparation> {
        let mode = self.active_mode()?;
        let mut prep = StartPreparation {
            mode,
            auto_op: None,
            mods: None,
            warnings: Vec::new(),
        };
        let Some(mode) = mode else {
            prep.warnings.push("No mode recorded; skipping the mod check".to_string());
            return Ok(prep);
        };
        if mode.mod_policy() != ModPolicy::Full {
            return Ok(prep);
        }

        match setup_auto_op(&self.root) {
            Ok(setup) => prep.auto_op = Some(setup),
            Err(e) => prep.warnings.push(format!("Could not configure auto-op: {}", e)),
        }
        let mods = self.reconcile_mods(mode, &mut prep.warnings)?;
        prep.mods = Some(mods);
        Ok(prep)
    }

    /// Delete `mode`'s ephemeral world group. Returns the deleted folders.
    pub fn reset_world(&self, mode: EnvironmentMode, force: bool) -> ModeResult<Vec<PathBuf>> {
        let world = mode.world();
        if world.role != WorldRole::Ephemeral {
            return Err(ModeError::NotEphemeral {
                mode,
                role: world.role.to_string(),
            });
        }
        let mut warnings = Vec::new();
        self.check_liveness(&[world], force, &mut warnings)?;
        Ok(self.delete_group(&world)?)
    }

    /// Rebuild the production working copy from its backup, keeping the old
    /// working copy under a timestamped name.
    pub fn reset_working_copy(&self, force: bool) -> ModeResult<WorldAction> {
        let backup = WorldDataSet::PRODUCTION_BACKUP;
        if !backup.exists(&self.root) {
            return Err(ModeError::NoBackup(backup.primary_path(&self.root)));
        }
        let mut warnings = Vec::new();
        self.check_liveness(&[WorldDataSet::PRODUCTION_LOCAL], force, &mut warnings)?;
        Ok(self.replace_from_backup(&backup, &WorldDataSet::PRODUCTION_LOCAL)?)
    }

    /// Active mode, every known world group and the jar count.
    pub fn status(&self) -> ModeResult<StatusReport> {
        let worlds = WorldDataSet::known()
            .into_iter()
            .map(|world| {
                let mut stats = DirStats::default();
                let mut live = false;
                for dim in world.dimension_paths(&self.root) {
                    if let Ok(s) = dir_stats(&dim) {
                        stats.files += s.files;
                        stats.bytes += s.bytes;
                    }
                    live |= liveness(&dim);
                }
                WorldStatus {
                    present: world.exists(&self.root),
                    world,
                    stats,
                    live,
                }
            })
            .collect();

        Ok(StatusReport {
            active: self.active_mode()?,
            worlds,
            mod_count: list_jars(&self.mods_dir()).map(|j| j.len()).unwrap_or(0),
        })
    }

    fn check_liveness(
        &self,
        worlds: &[WorldDataSet],
        force: bool,
        warnings: &mut Vec<String>,
    ) -> ModeResult<()> {
        for world in worlds {
            for dim in world.dimension_paths(&self.root) {
                if !liveness(&dim) {
                    continue;
                }
                if !force {
                    return Err(ModeError::ProcessMayBeRunning(dim));
                }
                warnings.push(format!(
                    "Lock marker present in {}; continuing because of --force",
                    dim.display()
                ));
            }
        }
        Ok(())
    }

    fn sync_configs(
        &self,
        target: EnvironmentMode,
        warnings: &mut Vec<String>,
    ) -> SyncResult<Option<usize>> {
        let Some(source) = self.pack_config.as_ref() else {
            return Ok(None);
        };
        if !target.syncs_pack_config() {
            return Ok(None);
        }
        if !source.is_dir() {
            warnings.push(format!(
                "Modpack config folder {} not found; config sync skipped",
                source.display()
            ));
            return Ok(None);
        }
        let count = sync_pack_config(source, &self.root.join(CONFIG_DIR))?;
        info!(mode = %target, count, "Synced modpack configuration");
        Ok(Some(count))
    }

    fn reconcile_world(
        &self,
        target: EnvironmentMode,
        reset: bool,
        warnings: &mut Vec<String>,
    ) -> SyncResult<WorldAction> {
        let world = target.world();
        let Some(backup) = target.backup() else {
            if reset && world.exists(&self.root) {
                self.delete_group(&world)?;
                return Ok(WorldAction::Generated);
            }
            return Ok(if world.exists(&self.root) {
                WorldAction::KeptExisting
            } else {
                WorldAction::Generated
            });
        };

        match (backup.exists(&self.root), world.exists(&self.root)) {
            (true, false) => {
                let mut files = 0;
                for (src, dest) in backup
                    .dimension_paths(&self.root)
                    .into_iter()
                    .zip(world.dimension_paths(&self.root))
                {
                    if src.exists() {
                        files += copy_tree(&dest, &src)?.files;
                    }
                }
                info!(
                    from = backup.base,
                    to = world.base,
                    files,
                    "Created working copy from backup"
                );
                Ok(WorldAction::CopiedFromBackup { files })
            }
            (true, true) if reset => self.replace_from_backup(&backup, &world),
            (true, true) => Ok(WorldAction::KeptExisting),
            (false, true) => {
                warnings.push(format!(
                    "No backup ({}); using the existing {}",
                    backup.base, world.base
                ));
                Ok(WorldAction::KeptExisting)
            }
            (false, false) => {
                warnings.push(format!(
                    "No world data; download a backup or let the server generate {}",
                    world.base
                ));
                Ok(WorldAction::NoBackup)
            }
        }
    }

    fn replace_from_backup(
        &self,
        backup: &WorldDataSet,
        working: &WorldDataSet,
    ) -> SyncResult<WorldAction> {
        let mut backups = Vec::new();
        for (src, dest) in backup
            .dimension_paths(&self.root)
            .into_iter()
            .zip(working.dimension_paths(&self.root))
        {
            if !src.exists() {
                continue;
            }
            if let Some(old) = backup_then_replace(&dest, &src)? {
                backups.push(old);
            }
        }
        info!(
            from = backup.base,
            to = working.base,
            kept = backups.len(),
            "Reset working copy from backup"
        );
        Ok(WorldAction::ResetFromBackup { backups })
    }

    fn delete_group(&self, world: &WorldDataSet) -> SyncResult<Vec<PathBuf>> {
        let mut deleted = Vec::new();
        for dim in world.dimension_paths(&self.root) {
            if !dim.exists() {
                continue;
            }
            fs::remove_dir_all(&dim).map_err(|e| SyncError::io(&dim, e))?;
            info!(path = %dim.display(), "Deleted world folder");
            deleted.push(dim);
        }
        Ok(deleted)
    }

    fn toggle_updater(&self, policy: ModPolicy) -> SyncResult<bool> {
        match policy {
            ModPolicy::FabricApiOnly => disable_auto_updater(&self.root),
            ModPolicy::Full => restore_auto_updater(&self.root),
        }
    }

    fn reconcile_mods(
        &self,
        target: EnvironmentMode,
        warnings: &mut Vec<String>,
    ) -> ModeResult<ModAction> {
        let policy = target.mod_policy();
        let mods_dir = self.mods_dir();
        let satisfied = self
            .rules
            .is_satisfied(policy, &mods_dir)
            .map_err(|e| {
                ModeError::mod_step(target, &InstallError::from(SyncError::io(&mods_dir, e)))
            })?;
        if satisfied {
            return Ok(ModAction::AlreadySatisfied);
        }

        match policy {
            ModPolicy::FabricApiOnly => {
                let summary = self
                    .rules
                    .prune_to_protected(&mods_dir)
                    .map_err(|e| ModeError::mod_step(target, &InstallError::from(e)))?;
                prune_outcome(target, summary, warnings)
            }
            ModPolicy::Full => {
                info!(mode = %target, "Mod set incomplete, provisioning");
                let summary = self
                    .provisioner
                    .provision()
                    .map_err(|e| ModeError::mod_step(target, &e))?;
                if !summary.is_complete() {
                    warnings.push(format!(
                        "{} of {} mod downloads failed",
                        summary.failed,
                        summary.failed + summary.downloaded + summary.skipped
                    ));
                }
                Ok(ModAction::Installed(summary))
            }
        }
    }
}

/// A prune that left files behind has not met the policy.
fn prune_outcome(
    target: EnvironmentMode,
    summary: RemoveSummary,
    warnings: &mut Vec<String>,
) -> ModeResult<ModAction> {
    if summary.is_clean() {
        info!(removed = summary.removed_count(), "Pruned mods to core dependency");
        return Ok(ModAction::Pruned(summary.removed_count()));
    }
    for (path, reason) in &summary.failed {
        warnings.push(format!("Could not remove {}: {}", path.display(), reason));
    }
    let names: Vec<String> = summary
        .failed
        .iter()
        .map(|(path, _)| path.display().to_string())
        .collect();
    Err(ModeError::ModStep {
        mode: target,
        reason: format!(
            "{} mod file(s) could not be removed (server running?): {}",
            names.len(),
            names.join(", ")
        ),
        category: ErrorCategory::Io,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::MemoryModeStore;
    use crate::package::InstallResult;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Writes `count` jars into `mods/` when asked to provision.
    struct FakeProvisioner {
        mods_dir: PathBuf,
        count: usize,
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl ModProvisioner for FakeProvisioner {
        fn provision(&self) -> InstallResult<InstallSummary> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(InstallError::NoSource {
                    dir: self.mods_dir.clone(),
                    prefix: "MCC-".to_string(),
                });
            }
            fs::create_dir_all(&self.mods_dir).unwrap();
            for i in 0..self.count {
                fs::write(self.mods_dir.join(format!("mod{}.jar", i)), "jar").unwrap();
            }
            Ok(InstallSummary {
                downloaded: self.count,
                ..Default::default()
            })
        }
    }

    struct Fixture {
        temp: TempDir,
        calls: Arc<AtomicUsize>,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            for mode in EnvironmentMode::ALL {
                fs::write(
                    temp.path().join(mode.template_name()),
                    format!("level-name={}\nmotd={}\n", mode.world().base, mode),
                )
                .unwrap();
            }
            Self {
                temp,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn root(&self) -> &Path {
            self.temp.path()
        }

        fn manager(&self, fail_provision: bool) -> ModeStateManager {
            let provisioner = FakeProvisioner {
                mods_dir: self.root().join(MODS_DIR),
                count: 4,
                calls: self.calls.clone(),
                fail: fail_provision,
            };
            ModeStateManager::new(
                self.root(),
                Box::new(MemoryModeStore::default()),
                Box::new(provisioner),
                ModRules {
                    protected_name: "fabric-api".to_string(),
                    min_full_count: 4,
                },
            )
        }

        fn seed_backup(&self, files: usize) {
            let dir = self.root().join("world-production");
            fs::create_dir_all(dir.join("region")).unwrap();
            for i in 0..files {
                let region = dir.join("region").join(format!("r.{}.mca", i));
                fs::write(region, vec![i as u8; 64]).unwrap();
            }
        }

        fn active_properties(&self) -> String {
            fs::read_to_string(self.root().join(ACTIVE_PROPERTIES)).unwrap()
        }
    }

    #[test]
    fn test_missing_template_changes_nothing() {
        let fx = Fixture::new();
        fs::remove_file(fx.root().join("server.properties.fresh")).unwrap();
        let manager = fx.manager(false);

        let err = manager
            .switch_mode(EnvironmentMode::Fresh, SwitchOptions::default())
            .unwrap_err();

        assert!(matches!(err, ModeError::TemplateMissing(_)));
        assert!(!fx.root().join(ACTIVE_PROPERTIES).exists());
        assert_eq!(manager.active_mode().unwrap(), None);
        assert_eq!(fx.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_switch_installs_missing_mods_once() {
        let fx = Fixture::new();
        let manager = fx.manager(false);

        let report = manager
            .switch_mode(EnvironmentMode::Fresh, SwitchOptions::default())
            .unwrap();
        assert!(matches!(report.mods, ModAction::Installed(_)));
        assert_eq!(report.world, WorldAction::Generated);

        let report = manager
            .switch_mode(EnvironmentMode::Test, SwitchOptions::default())
            .unwrap();
        assert_eq!(report.mods, ModAction::AlreadySatisfied);
        assert_eq!(report.previous, Some(EnvironmentMode::Fresh));
        assert_eq!(fx.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_vanilla_prunes_and_disables_updater() {
        let fx = Fixture::new();
        let mods = fx.root().join(MODS_DIR);
        fs::create_dir_all(&mods).unwrap();
        for name in ["fabric-api-0.92.jar", "sodium.jar", "lithium.jar", "sodium.pw.toml"] {
            fs::write(mods.join(name), "x").unwrap();
        }
        fs::write(fx.root().join("packwiz-installer-bootstrap.jar"), "x").unwrap();
        let manager = fx.manager(false);

        let report = manager
            .switch_mode(EnvironmentMode::Vanilla, SwitchOptions::default())
            .unwrap();

        assert_eq!(report.mods, ModAction::Pruned(3));
        assert!(report.updater_toggled);
        assert_eq!(list_jars(&mods).unwrap(), vec!["fabric-api-0.92.jar"]);
        assert!(fx
            .root()
            .join("packwiz-installer-bootstrap.jar.disabled")
            .exists());

        // Back to a full mode restores the updater and reinstalls
        let report = manager
            .switch_mode(EnvironmentMode::Fresh, SwitchOptions::default())
            .unwrap();
        assert!(report.updater_toggled);
        assert!(fx.root().join("packwiz-installer-bootstrap.jar").exists());
        assert!(matches!(report.mods, ModAction::Installed(_)));
    }

    #[test]
    fn test_prune_leftovers_are_a_recoverable_mod_error() {
        let locked = PathBuf::from("mods/sodium.jar");
        let summary = RemoveSummary {
            removed: vec![PathBuf::from("mods/lithium.jar")],
            kept: 1,
            failed: vec![(locked.clone(), "Operation not permitted".to_string())],
        };
        let mut warnings = Vec::new();

        let err = prune_outcome(EnvironmentMode::Vanilla, summary, &mut warnings).unwrap_err();

        assert!(matches!(err, ModeError::ModStep { mode: EnvironmentMode::Vanilla, .. }));
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("sodium.jar"));
        assert_eq!(warnings.len(), 1);

        let clean = RemoveSummary {
            removed: vec![locked],
            ..Default::default()
        };
        assert_eq!(
            prune_outcome(EnvironmentMode::Vanilla, clean, &mut warnings).unwrap(),
            ModAction::Pruned(1)
        );
    }

    #[test]
    fn test_unreadable_mods_dir_fails_mod_step() {
        let fx = Fixture::new();
        fs::write(fx.root().join(MODS_DIR), "not a directory").unwrap();
        let manager = fx.manager(false);

        let err = manager
            .switch_mode(EnvironmentMode::Vanilla, SwitchOptions::default())
            .unwrap_err();

        assert!(matches!(err, ModeError::ModStep { .. }));
        assert!(err.is_recoverable());
        assert_eq!(manager.active_mode().unwrap(), Some(EnvironmentMode::Vanilla));
    }

    #[test]
    fn test_production_switch_syncs_pack_config() {
        let fx = Fixture::new();
        let pack_config = fx.root().join("MCC/config");
        fs::create_dir_all(pack_config.join("lithium")).unwrap();
        fs::write(pack_config.join("lithium/mixins.properties"), "ai=false").unwrap();
        let manager = fx.manager(false).with_pack_config(&pack_config);

        let report = manager
            .switch_mode(EnvironmentMode::Production, SwitchOptions::default())
            .unwrap();
        assert_eq!(report.configs_synced, Some(1));
        assert_eq!(
            fs::read_to_string(fx.root().join("config/lithium/mixins.properties")).unwrap(),
            "ai=false"
        );

        let report = manager
            .switch_mode(EnvironmentMode::Test, SwitchOptions::default())
            .unwrap();
        assert_eq!(report.configs_synced, None);
    }

    #[test]
    fn test_missing_pack_config_is_a_warning() {
        let fx = Fixture::new();
        let manager = fx
            .manager(false)
            .with_pack_config(fx.root().join("MCC/config"));

        let report = manager
            .switch_mode(EnvironmentMode::Production, SwitchOptions::default())
            .unwrap();

        assert_eq!(report.configs_synced, None);
        assert!(report.warnings.iter().any(|w| w.contains("config sync skipped")));
    }

    #[test]
    fn test_prepare_start_tops_up_mods_once() {
        let fx = Fixture::new();
        fs::write(fx.root().join(ACTIVE_PROPERTIES), "level-name=world-test\n").unwrap();
        let manager = fx.manager(false);

        let prep = manager.prepare_start().unwrap();
        assert_eq!(prep.mode, Some(EnvironmentMode::Test));
        assert_eq!(prep.auto_op, Some(AutoOpSetup::NotInstalled));
        assert!(matches!(prep.mods, Some(ModAction::Installed(_))));

        let prep = manager.prepare_start().unwrap();
        assert_eq!(prep.mods, Some(ModAction::AlreadySatisfied));
        assert_eq!(fx.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_prepare_start_leaves_vanilla_alone() {
        let fx = Fixture::new();
        fs::write(fx.root().join(ACTIVE_PROPERTIES), "level-name=world-vanilla\n").unwrap();
        let manager = fx.manager(false);

        let prep = manager.prepare_start().unwrap();

        assert_eq!(prep.mode, Some(EnvironmentMode::Vanilla));
        assert_eq!(prep.auto_op, None);
        assert_eq!(prep.mods, None);
        assert_eq!(fx.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_prepare_start_reports_failed_provision() {
        let fx = Fixture::new();
        fs::write(fx.root().join(ACTIVE_PROPERTIES), "level-name=world-fresh\n").unwrap();

        let err = fx.manager(true).prepare_start().unwrap_err();

        assert!(matches!(err, ModeError::ModStep { mode: EnvironmentMode::Fresh, .. }));
    }

    #[test]
    fn test_prepare_start_without_mode() {
        let fx = Fixture::new();
        let prep = fx.manager(false).prepare_start().unwrap();
        assert_eq!(prep.mode, None);
        assert_eq!(prep.mods, None);
        assert_eq!(prep.warnings.len(), 1);
    }

    #[test]
    fn test_liveness_refuses_before_mutation() {
        let fx = Fixture::new();
        fx.seed_backup(2);
        let manager = fx.manager(false);
        manager
            .switch_mode(EnvironmentMode::Production, SwitchOptions::default())
            .unwrap();
        fs::write(fx.root().join("world-local/session.lock"), "").unwrap();

        let err = manager
            .switch_mode(EnvironmentMode::Fresh, SwitchOptions::default())
            .unwrap_err();
        assert!(matches!(err, ModeError::ProcessMayBeRunning(_)));
        assert!(fx.active_properties().contains("world-local"));
        assert_eq!(manager.active_mode().unwrap(), Some(EnvironmentMode::Production));

        let report = manager
            .switch_mode(
                EnvironmentMode::Fresh,
                SwitchOptions {
                    force: true,
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(report.warnings.len(), 1);
        assert!(fx.active_properties().contains("world-fresh"));
    }

    #[test]
    fn test_existing_working_copy_kept_unless_reset() {
        let fx = Fixture::new();
        fx.seed_backup(3);
        let manager = fx.manager(false);
        manager
            .switch_mode(EnvironmentMode::Production, SwitchOptions::default())
            .unwrap();
        let played = fx.root().join("world-local/region/r.0.mca");
        fs::write(&played, "played").unwrap();

        let report = manager
            .switch_mode(EnvironmentMode::Production, SwitchOptions::default())
            .unwrap();
        assert_eq!(report.world, WorldAction::KeptExisting);
        assert_eq!(fs::read_to_string(&played).unwrap(), "played");

        let report = manager
            .switch_mode(
                EnvironmentMode::Production,
                SwitchOptions {
                    reset: true,
                    ..Default::default()
                },
            )
            .unwrap();
        let WorldAction::ResetFromBackup { backups } = report.world else {
            panic!("expected reset, got {:?}", report.world);
        };
        assert_eq!(backups.len(), 1);
        assert_eq!(
            fs::read_to_string(backups[0].join("region/r.0.mca")).unwrap(),
            "played"
        );
        assert_ne!(fs::read_to_string(&played).unwrap(), "played");
    }

    #[test]
    fn test_provision_failure_still_records_mode() {
        let fx = Fixture::new();
        let manager = fx.manager(true);

        let err = manager
            .switch_mode(EnvironmentMode::Test, SwitchOptions::default())
            .unwrap_err();

        assert!(err.is_recoverable());
        assert_eq!(manager.active_mode().unwrap(), Some(EnvironmentMode::Test));
        assert!(fx.active_properties().contains("world-test"));
    }

    #[test]
    fn test_active_mode_inferred_from_level_name() {
        let fx = Fixture::new();
        fs::write(fx.root().join(ACTIVE_PROPERTIES), "motd=x\nlevel-name=world-vanilla\n").unwrap();
        let manager = fx.manager(false);

        assert_eq!(manager.active_mode().unwrap(), Some(EnvironmentMode::Vanilla));
    }

    #[test]
    fn test_reset_world_refuses_working_copy() {
        let fx = Fixture::new();
        let manager = fx.manager(false);
        assert!(matches!(
            manager.reset_world(EnvironmentMode::Production, false),
            Err(ModeError::NotEphemeral { .. })
        ));

        fs::create_dir_all(fx.root().join("world-fresh_nether")).unwrap();
        fs::create_dir_all(fx.root().join("world-fresh")).unwrap();
        let deleted = manager.reset_world(EnvironmentMode::Fresh, false).unwrap();
        assert_eq!(deleted.len(), 2);
        assert!(!fx.root().join("world-fresh").exists());
    }

    #[test]
    fn test_reset_working_copy_requires_backup() {
        let fx = Fixture::new();
        let manager = fx.manager(false);
        assert!(matches!(
            manager.reset_working_copy(false),
            Err(ModeError::NoBackup(_))
        ));
    }

    #[test]
    fn test_status_counts_world_files() {
        let fx = Fixture::new();
        fx.seed_backup(5);
        let manager = fx.manager(false);

        let status = manager.status().unwrap();
        let backup = status
            .worlds
            .iter()
            .find(|w| w.world == WorldDataSet::PRODUCTION_BACKUP)
            .unwrap();
        assert!(backup.present);
        assert_eq!(backup.stats.files, 5);
        assert_eq!(status.mod_count, 0);
        assert_eq!(status.active, None);
    }
}

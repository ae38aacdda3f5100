//! Integration tests for mode switching.
//!
//! These drive [`ModeStateManager`] against a real directory tree with the
//! production mod provisioner wired in (only HTTP is faked):
//! - Working copy created byte-identical from the backup, backup untouched
//! - Template round trip across modes
//! - Modpack config copied in on the way to production
//! - Mod pruning for vanilla and reinstall on the way back
//! - Liveness refusal leaves the directory unchanged

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use localserver::fetch::{Downloader, FetchError, FetchResult};
use localserver::mode::{
    EnvironmentMode, FileModeStore, ModAction, ModRules, ModeError, ModeStateManager,
    SwitchOptions, WorldAction, MODE_FILE_NAME,
};
use localserver::package::{InstallerProvisioner, PackageInstaller, MANIFEST_NAME};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

// =============================================================================
// Test Helpers
// =============================================================================

/// URL → body; unknown URLs are 404.
#[derive(Default)]
struct FakeDownloader {
    bodies: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

impl Downloader for FakeDownloader {
    fn download(&self, url: &str, dest: &Path) -> FetchResult<u64> {
        self.requests.lock().unwrap().push(url.to_string());
        match self.bodies.get(url) {
            Some(body) => {
                fs::create_dir_all(dest.parent().unwrap()).unwrap();
                fs::write(dest, body).unwrap();
                Ok(body.len() as u64)
            }
            None => Err(FetchError::NotFound {
                url: url.to_string(),
            }),
        }
    }
}

const MANIFEST: &str = r#"{
    "formatVersion": 1,
    "game": "minecraft",
    "versionId": "0.9.50",
    "name": "MCC",
    "files": [
        {"path": "mods/fabric-api-0.92.jar", "downloads": ["https://cdn/fabric-api.jar"]},
        {"path": "mods/lithium.jar", "downloads": ["https://cdn/lithium.jar"],
         "env": {"client": "unsupported", "server": "required"}},
        {"path": "mods/sodium.jar", "downloads": ["https://cdn/sodium.jar"],
         "env": {"client": "required", "server": "unsupported"}},
        {"path": "mods/ferritecore.jar", "downloads": ["https://cdn/ferritecore.jar"]}
    ],
    "dependencies": {"minecraft": "1.20.1", "fabric-loader": "0.15.3"}
}"#;

fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let file = fs::File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    for (name, contents) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(contents).unwrap();
    }
    zip.finish().unwrap();
}

/// Relative path → contents for every file under `dir`.
fn snapshot(dir: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    fn walk(base: &Path, dir: &Path, out: &mut BTreeMap<PathBuf, Vec<u8>>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(base, &path, out);
            } else {
                let rel = path.strip_prefix(base).unwrap().to_path_buf();
                out.insert(rel, fs::read(&path).unwrap());
            }
        }
    }
    let mut out = BTreeMap::new();
    walk(dir, dir, &mut out);
    out
}

struct ServerDir {
    _temp: TempDir,
    root: PathBuf,
    downloader: Arc<FakeDownloader>,
}

impl ServerDir {
    /// A server root with three templates, a ten-file production backup and
    /// an exported modpack artifact in the repository.
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("server");
        let repo = temp.path().join("MCC");
        fs::create_dir_all(root.join("mods")).unwrap();
        fs::create_dir_all(&repo).unwrap();

        for mode in ["production", "test", "vanilla", "fresh"] {
            let world = mode.parse::<EnvironmentMode>().unwrap().world().base;
            fs::write(
                root.join(format!("server.properties.{}", mode)),
                format!("level-name={}\nmotd={} server\n", world, mode),
            )
            .unwrap();
        }
        fs::write(root.join("server.properties"), "level-name=world-test\n").unwrap();

        let backup = root.join("world-production");
        for i in 0..8 {
            let dir = backup.join("region");
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join(format!("r.{}.0.mca", i)), vec![i as u8; 64 + i]).unwrap();
        }
        fs::write(backup.join("level.dat"), b"\x0a\x00\x00level").unwrap();
        fs::write(backup.join("uid.dat"), b"uid").unwrap();

        fs::create_dir_all(repo.join("config/lithium")).unwrap();
        fs::write(repo.join("config/lithium/mixins.properties"), "ai=false").unwrap();

        write_zip(
            &repo.join("MCC-0.9.50.mrpack"),
            &[
                (MANIFEST_NAME, MANIFEST.as_bytes()),
                ("overrides/config/lithium.properties", b"mixin.ai=false"),
            ],
        );

        let mut downloader = FakeDownloader::default();
        for name in ["fabric-api", "lithium", "sodium"] {
            downloader.bodies.insert(
                format!("https://cdn/{}.jar", name),
                format!("{} jar", name).into_bytes(),
            );
        }

        Self {
            _temp: temp,
            root,
            downloader: Arc::new(downloader),
        }
    }

    fn manager(&self) -> ModeStateManager {
        let repo = self.root.parent().unwrap().join("MCC");
        let installer = PackageInstaller::new(
            self.downloader.clone(),
            Vec::new(),
            &self.root,
            "fabric-api",
        );
        ModeStateManager::new(
            &self.root,
            Box::new(FileModeStore::in_dir(&self.root)),
            Box::new(InstallerProvisioner::new(installer, repo, "MCC-", None)),
            ModRules {
                protected_name: "fabric-api".to_string(),
                min_full_count: 2,
            },
        )
        .with_pack_config(self.root.parent().unwrap().join("MCC/config"))
    }

    fn properties(&self) -> String {
        fs::read_to_string(self.root.join("server.properties")).unwrap()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn test_production_switch_copies_backup_byte_identical() {
    let dir = ServerDir::new();
    let backup = dir.root.join("world-production");
    let before = snapshot(&backup);
    assert_eq!(before.len(), 10);

    let report = dir
        .manager()
        .switch_mode(EnvironmentMode::Production, SwitchOptions::default())
        .unwrap();

    assert_eq!(report.mode, EnvironmentMode::Production);
    assert_eq!(report.previous, Some(EnvironmentMode::Test));
    assert_eq!(report.world, WorldAction::CopiedFromBackup { files: 10 });
    assert_eq!(snapshot(&dir.root.join("world-local")), before);
    assert_eq!(snapshot(&backup), before);
    assert!(dir.root.join(MODE_FILE_NAME).exists());
}

#[test]
fn test_production_switch_provisions_server_mods() {
    let dir = ServerDir::new();

    let report = dir
        .manager()
        .switch_mode(EnvironmentMode::Production, SwitchOptions::default())
        .unwrap();

    let ModAction::Installed(summary) = &report.mods else {
        panic!("expected an install, got {:?}", report.mods);
    };
    assert_eq!(summary.downloaded, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.excluded, 1);
    assert!(summary.overrides_applied);
    assert!(dir.root.join("mods/lithium.jar").exists());
    assert!(!dir.root.join("mods/sodium.jar").exists());
    assert!(dir.root.join("config/lithium.properties").exists());
    assert_eq!(report.configs_synced, Some(1));
    assert!(dir.root.join("config/lithium/mixins.properties").exists());
    assert!(report.warnings.iter().any(|w| w.contains("failed")));

    let requests = dir.downloader.requests.lock().unwrap().clone();
    assert!(!requests.iter().any(|u| u.contains("sodium")));
}

#[test]
fn test_template_round_trip() {
    let dir = ServerDir::new();
    let manager = dir.manager();
    let production_template =
        fs::read_to_string(dir.root.join("server.properties.production")).unwrap();

    manager
        .switch_mode(EnvironmentMode::Production, SwitchOptions::default())
        .unwrap();
    assert_eq!(dir.properties(), production_template);

    let vanilla = manager
        .switch_mode(EnvironmentMode::Vanilla, SwitchOptions::default())
        .unwrap();
    assert!(dir.properties().contains("level-name=world-vanilla"));
    assert_eq!(vanilla.world, WorldAction::Generated);
    assert_eq!(vanilla.mods, ModAction::Pruned(1));
    let jars: Vec<_> = fs::read_dir(dir.root.join("mods"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(jars, vec!["fabric-api-0.92.jar".to_string()]);

    let back = manager
        .switch_mode(EnvironmentMode::Production, SwitchOptions::default())
        .unwrap();
    assert_eq!(dir.properties(), production_template);
    assert_eq!(back.previous, Some(EnvironmentMode::Vanilla));
    assert_eq!(back.world, WorldAction::KeptExisting);
    assert!(matches!(back.mods, ModAction::Installed(ref s) if s.skipped == 1));
    assert_eq!(
        manager.active_mode().unwrap(),
        Some(EnvironmentMode::Production)
    );
}

#[test]
fn test_reset_rebuilds_working_copy_and_keeps_old_one() {
    let dir = ServerDir::new();
    let manager = dir.manager();
    manager
        .switch_mode(EnvironmentMode::Production, SwitchOptions::default())
        .unwrap();
    fs::write(dir.root.join("world-local/level.dat"), b"played").unwrap();

    let report = manager
        .switch_mode(
            EnvironmentMode::Production,
            SwitchOptions {
                reset: true,
                force: false,
            },
        )
        .unwrap();

    let WorldAction::ResetFromBackup { backups } = &report.world else {
        panic!("expected a reset, got {:?}", report.world);
    };
    assert_eq!(backups.len(), 1);
    assert_eq!(fs::read(backups[0].join("level.dat")).unwrap(), b"played");
    assert_eq!(
        snapshot(&dir.root.join("world-local")),
        snapshot(&dir.root.join("world-production"))
    );
}

#[test]
fn test_lock_marker_refuses_without_changes() {
    let dir = ServerDir::new();
    let manager = dir.manager();
    manager
        .switch_mode(EnvironmentMode::Production, SwitchOptions::default())
        .unwrap();
    fs::write(dir.root.join("world-local/session.lock"), b"").unwrap();
    let properties = dir.properties();

    let result = manager.switch_mode(EnvironmentMode::Test, SwitchOptions::default());

    assert!(matches!(result, Err(ModeError::ProcessMayBeRunning(_))));
    assert_eq!(dir.properties(), properties);
    assert_eq!(
        manager.active_mode().unwrap(),
        Some(EnvironmentMode::Production)
    );
}

#[test]
fn test_missing_template_aborts() {
    let dir = ServerDir::new();
    fs::remove_file(dir.root.join("server.properties.fresh")).unwrap();

    let result = dir
        .manager()
        .switch_mode(EnvironmentMode::Fresh, SwitchOptions::default());

    assert!(matches!(result, Err(ModeError::TemplateMissing(_))));
    assert_eq!(dir.properties(), "level-name=world-test\n");
    assert!(!dir.root.join(MODE_FILE_NAME).exists());
}

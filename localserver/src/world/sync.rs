//! World download and upload around the remote sync collaborator.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::remote::{ExclusionPolicy, RemoteSync};
use super::{WorldSyncError, WorldSyncResult};
use crate::mode::WorldDataSet;
use crate::rcon::RemoteCommand;
use crate::sync::{backup_then_replace, copy_tree, dir_stats, liveness, DirStats, SyncError};

/// One remote folder and its local backup folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldPair {
    pub remote: String,
    pub local: PathBuf,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DownloadOptions {
    pub include_large_files: bool,
    /// Replace the local folder without keeping the old one.
    pub no_backup: bool,
    /// Proceed despite a liveness marker.
    pub force: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UploadOptions {
    pub include_large_files: bool,
}

/// Result of downloading one folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedWorld {
    pub local: PathBuf,
    /// Where the previous folder was kept, if there was one.
    pub previous: Option<PathBuf>,
    pub stats: DirStats,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub uploaded: Vec<PathBuf>,
    /// Local folders that did not exist.
    pub skipped: Vec<PathBuf>,
    /// Whether a stop command reached the server.
    pub stop_sent: bool,
}

/// Moves the production backup world between the remote host and the
/// server root.
///
/// Downloads only ever write the backup group. Every dimension is transferred
/// into a staging directory first and the group is replaced through
/// [`backup_then_replace`] only after all transfers succeed, so a failed
/// transfer leaves the whole previous backup in place.
pub struct WorldSync {
    root: PathBuf,
    pairs: Vec<WorldPair>,
    remote: Box<dyn RemoteSync>,
    command: Option<Box<dyn RemoteCommand>>,
}

impl WorldSync {
    /// Pair `remote_worlds` in dimension order with the local backup group.
    pub fn new(
        root: impl Into<PathBuf>,
        remote_worlds: &[String],
        remote: Box<dyn RemoteSync>,
        command: Option<Box<dyn RemoteCommand>>,
    ) -> Self {
        let root = root.into();
        let pairs = remote_worlds
            .iter()
            .zip(WorldDataSet::PRODUCTION_BACKUP.dimension_paths(&root))
            .map(|(remote, local)| WorldPair {
                remote: remote.clone(),
                local,
            })
            .collect();
        Self {
            root,
            pairs,
            remote,
            command,
        }
    }

    pub fn pairs(&self) -> &[WorldPair] {
        &self.pairs
    }

    /// Mirror every remote folder into its local backup folder.
    pub fn download(&self, options: DownloadOptions) -> WorldSyncResult<Vec<DownloadedWorld>> {
        if self.pairs.is_empty() {
            return Err(WorldSyncError::NotConfigured(
                "no remote worlds listed".to_string(),
            ));
        }
        for pair in &self.pairs {
            if liveness(&pair.local) {
                if !options.force {
                    return Err(WorldSyncError::ProcessMayBeRunning(pair.local.clone()));
                }
                warn!(
                    path = %pair.local.display(),
                    "Lock marker present; continuing because of --force"
                );
            }
        }

        let policy = ExclusionPolicy::new(options.include_large_files);
        let staging_root = tempfile::Builder::new()
            .prefix(".world-download-")
            .tempdir_in(&self.root)
            .map_err(|e| SyncError::io(&self.root, e))?;

        let mut staged = Vec::with_capacity(self.pairs.len());
        for pair in &self.pairs {
            let staging = staging_root.path().join(file_name(&pair.local)?);
            fs::create_dir_all(&staging).map_err(|e| SyncError::io(&staging, e))?;

            info!(remote = %pair.remote, local = %pair.local.display(), "Downloading world");
            self.remote.download(&pair.remote, &staging, &policy)?;
            staged.push((pair, staging));
        }

        // Every dimension is staged; only now touch the backup group.
        let mut results = Vec::with_capacity(staged.len());
        for (pair, staging) in staged {
            let previous = if options.no_backup {
                replace_without_backup(&pair.local, &staging)?;
                None
            } else {
                backup_then_replace(&pair.local, &staging)?
            };
            let stats = dir_stats(&pair.local).map_err(|e| SyncError::io(&pair.local, e))?;
            info!(
                local = %pair.local.display(),
                files = stats.files,
                bytes = stats.bytes,
                "World downloaded"
            );
            results.push(DownloadedWorld {
                local: pair.local.clone(),
                previous,
                stats,
            });
        }
        Ok(results)
    }

    /// Stop the server if possible, then mirror the local backup group up.
    pub fn upload(&self, options: UploadOptions) -> WorldSyncResult<UploadReport> {
        let mut report = UploadReport::default();
        let Some(first) = self.pairs.first() else {
            return Err(WorldSyncError::NotConfigured(
                "no remote worlds listed".to_string(),
            ));
        };
        if !first.local.exists() {
            return Err(WorldSyncError::NothingToUpload(first.local.clone()));
        }

        if let Some(command) = &self.command {
            match command.send("stop") {
                Ok(_) => report.stop_sent = true,
                Err(e) => warn!(error = %e, "Could not send stop; assuming the server is down"),
            }
        }

        let policy = ExclusionPolicy::new(options.include_large_files);
        for pair in &self.pairs {
            if !pair.local.exists() {
                report.skipped.push(pair.local.clone());
                continue;
            }
            info!(local = %pair.local.display(), remote = %pair.remote, "Uploading world");
            self.remote.upload(&pair.local, &pair.remote, &policy)?;
            report.uploaded.push(pair.local.clone());
        }
        Ok(report)
    }
}

fn file_name(path: &Path) -> Result<String, SyncError> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| SyncError::InvalidPath(path.to_path_buf()))
}

/// Swap `staging` in after it is complete, dropping the old folder.
fn replace_without_backup(dest: &Path, staging: &Path) -> Result<(), SyncError> {
    if dest.exists() {
        fs::remove_dir_all(dest).map_err(|e| SyncError::io(dest, e))?;
    }
    copy_tree(dest, staging)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rcon::RconError;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Writes one file per download and records uploads.
    #[derive(Default)]
    struct FakeRemote {
        uploads: Mutex<Vec<(PathBuf, String)>>,
        downloads: Mutex<usize>,
        fail: bool,
        /// Fail the download with this zero-based index.
        fail_at: Option<usize>,
    }

    impl RemoteSync for FakeRemote {
        fn download(
            &self,
            remote: &str,
            local: &Path,
            policy: &ExclusionPolicy,
        ) -> WorldSyncResult<()> {
            let index = {
                let mut count = self.downloads.lock().unwrap();
                *count += 1;
                *count - 1
            };
            if self.fail || self.fail_at == Some(index) {
                return Err(WorldSyncError::Transfer {
                    remote: remote.to_string(),
                    reason: "connection reset".to_string(),
                });
            }
            fs::write(local.join("level.dat"), remote).unwrap();
            if !policy.is_excluded("DistantHorizons.sqlite") {
                fs::write(local.join("DistantHorizons.sqlite"), "big").unwrap();
            }
            Ok(())
        }

        fn upload(
            &self,
            local: &Path,
            remote: &str,
            _policy: &ExclusionPolicy,
        ) -> WorldSyncResult<()> {
            self.uploads
                .lock()
                .unwrap()
                .push((local.to_path_buf(), remote.to_string()));
            Ok(())
        }
    }

    struct FailingCommand;

    impl RemoteCommand for FailingCommand {
        fn send(&self, _command: &str) -> Result<String, RconError> {
            Err(RconError::NotConfigured)
        }
    }

    fn remotes() -> Vec<String> {
        vec!["/world".into(), "/world_nether".into(), "/world_the_end".into()]
    }

    #[test]
    fn test_download_keeps_previous_backup() {
        let temp = TempDir::new().unwrap();
        let old = temp.path().join("world-production");
        fs::create_dir_all(&old).unwrap();
        fs::write(old.join("level.dat"), "old").unwrap();
        let sync = WorldSync::new(temp.path(), &remotes(), Box::new(FakeRemote::default()), None);

        let results = sync.download(DownloadOptions::default()).unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(fs::read_to_string(old.join("level.dat")).unwrap(), "/world");
        assert!(!old.join("DistantHorizons.sqlite").exists());
        let previous = results[0].previous.as_ref().unwrap();
        assert_eq!(fs::read_to_string(previous.join("level.dat")).unwrap(), "old");
        assert!(results[1].previous.is_none());
    }

    #[test]
    fn test_failed_transfer_leaves_backup() {
        let temp = TempDir::new().unwrap();
        let old = temp.path().join("world-production");
        fs::create_dir_all(&old).unwrap();
        fs::write(old.join("level.dat"), "old").unwrap();
        let remote = FakeRemote {
            fail: true,
            ..Default::default()
        };
        let sync = WorldSync::new(temp.path(), &remotes(), Box::new(remote), None);

        assert!(matches!(
            sync.download(DownloadOptions::default()),
            Err(WorldSyncError::Transfer { .. })
        ));
        assert_eq!(fs::read_to_string(old.join("level.dat")).unwrap(), "old");
        let leftovers: Vec<_> = fs::read_dir(temp.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_failed_second_dimension_keeps_whole_backup_group() {
        let temp = TempDir::new().unwrap();
        let locals = WorldDataSet::PRODUCTION_BACKUP.dimension_paths(temp.path());
        for local in &locals {
            fs::create_dir_all(local).unwrap();
            fs::write(local.join("level.dat"), "OLD").unwrap();
        }
        let remote = FakeRemote {
            fail_at: Some(1),
            ..Default::default()
        };
        let sync = WorldSync::new(temp.path(), &remotes(), Box::new(remote), None);

        assert!(matches!(
            sync.download(DownloadOptions::default()),
            Err(WorldSyncError::Transfer { .. })
        ));
        for local in &locals {
            assert_eq!(fs::read_to_string(local.join("level.dat")).unwrap(), "OLD");
        }
        let entries = fs::read_dir(temp.path()).unwrap().count();
        assert_eq!(entries, locals.len());
    }

    #[test]
    fn test_download_refuses_on_lock_marker() {
        let temp = TempDir::new().unwrap();
        let old = temp.path().join("world-production");
        fs::create_dir_all(&old).unwrap();
        fs::write(old.join("session.lock"), "").unwrap();
        let sync = WorldSync::new(temp.path(), &remotes(), Box::new(FakeRemote::default()), None);

        assert!(matches!(
            sync.download(DownloadOptions::default()),
            Err(WorldSyncError::ProcessMayBeRunning(_))
        ));
    }

    #[test]
    fn test_download_without_backup_and_large_files() {
        let temp = TempDir::new().unwrap();
        let old = temp.path().join("world-production");
        fs::create_dir_all(&old).unwrap();
        fs::write(old.join("stale.mca"), "x").unwrap();
        let sync = WorldSync::new(temp.path(), &remotes(), Box::new(FakeRemote::default()), None);

        let results = sync
            .download(DownloadOptions {
                include_large_files: true,
                no_backup: true,
                force: false,
            })
            .unwrap();

        assert!(results.iter().all(|r| r.previous.is_none()));
        assert!(!old.join("stale.mca").exists());
        assert!(old.join("DistantHorizons.sqlite").exists());
    }

    #[test]
    fn test_upload_skips_missing_dimensions() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("world-production")).unwrap();
        let sync = WorldSync::new(
            temp.path(),
            &remotes(),
            Box::new(FakeRemote::default()),
            Some(Box::new(FailingCommand)),
        );

        let report = sync.upload(UploadOptions::default()).unwrap();

        assert!(!report.stop_sent);
        assert_eq!(report.uploaded, vec![temp.path().join("world-production")]);
        assert_eq!(report.skipped.len(), 2);
    }

    #[test]
    fn test_upload_requires_local_world() {
        let temp = TempDir::new().unwrap();
        let sync = WorldSync::new(temp.path(), &remotes(), Box::new(FakeRemote::default()), None);
        assert!(matches!(
            sync.upload(UploadOptions::default()),
            Err(WorldSyncError::NothingToUpload(_))
        ));
    }
}

//! Manifest-driven package installation.
//!
//! Pipeline: obtain archive (remote release or local file) → parse manifest →
//! optional clearing → per-entry download of server-side files → overrides →
//! optional stale pruning. Per-entry failures are counted, never fatal.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha2::{Digest, Sha512};
use tempfile::TempDir;
use tracing::{debug, info, warn};

use super::archive::PackageArchive;
use super::manifest::PackageManifestEntry;
use super::{InstallError, InstallResult};
use crate::fetch::{Downloader, FetchError, RemoteArtifactFetcher, VersionRef};
use crate::sync::{atomic_copy, remove_tree, remove_unprotected};

/// Directory, relative to the deployment root, holding mod archives.
pub const MODS_DIR: &str = "mods";

/// Where the package archive comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallSource {
    /// Download the release for this version.
    Remote(VersionRef),
    /// Use an archive already on disk.
    LocalFile(PathBuf),
}

/// What to do with mods already deployed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClearPolicy {
    /// Leave existing files alone.
    #[default]
    Keep,
    /// Before installing, remove every file in `mods/` except protected ones.
    RemoveExisting,
    /// After installing, remove jars in `mods/` the package does not
    /// provide, except protected ones.
    PruneStale,
}

/// One manifest entry that could not be deployed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of an installation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallSummary {
    /// Entries downloaded and placed.
    pub downloaded: usize,
    /// Deployable entries that could not be placed.
    pub failed: usize,
    /// Deployable entries already present locally.
    pub skipped: usize,
    /// Entries not meant for a server.
    pub excluded: usize,
    /// Files removed by the clearing policy.
    pub removed: usize,
    /// Whether any override files were copied.
    pub overrides_applied: bool,
    /// Number of override files copied.
    pub override_files: usize,
    pub failures: Vec<EntryFailure>,
}

impl InstallSummary {
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Installs packages into a deployment root (the server directory).
pub struct PackageInstaller {
    downloader: Arc<dyn Downloader>,
    fetcher: RemoteArtifactFetcher,
    deploy_root: PathBuf,
    protected_name: String,
    scratch_parent: Option<PathBuf>,
}

impl PackageInstaller {
    /// Create an installer.
    ///
    /// `release_urls` are the URL templates used for remote sources;
    /// `protected_name` is the name fragment that clearing never removes.
    pub fn new(
        downloader: Arc<dyn Downloader>,
        release_urls: Vec<String>,
        deploy_root: impl Into<PathBuf>,
        protected_name: impl Into<String>,
    ) -> Self {
        Self {
            fetcher: RemoteArtifactFetcher::new(downloader.clone(), release_urls),
            downloader,
            deploy_root: deploy_root.into(),
            protected_name: protected_name.into(),
            scratch_parent: None,
        }
    }

    /// Create scratch directories under `dir` instead of the system temp dir.
    pub fn with_scratch_parent(mut self, dir: Option<PathBuf>) -> Self {
        self.scratch_parent = dir;
        self
    }

    pub fn deploy_root(&self) -> &Path {
        &self.deploy_root
    }

    pub fn mods_dir(&self) -> PathBuf {
        self.deploy_root.join(MODS_DIR)
    }

    /// Whether `path` names the protected mod (case-insensitive).
    pub fn is_protected(&self, path: &Path) -> bool {
        path.file_name()
            .map(|n| {
                n.to_string_lossy()
                    .to_lowercase()
                    .contains(&self.protected_name.to_lowercase())
            })
            .unwrap_or(false)
    }

    /// Remove every unprotected file from `mods/`. Returns the count removed.
    pub fn clear_mods(&self) -> InstallResult<usize> {
        let summary = remove_unprotected(&self.mods_dir(), |p| self.is_protected(p))?;
        for (path, reason) in &summary.failed {
            warn!(path = %path.display(), reason = %reason, "Could not remove mod");
        }
        Ok(summary.removed_count())
    }

    /// Install a package.
    ///
    /// The scratch directory is removed when this returns, whatever the
    /// outcome.
    pub fn install(
        &self,
        source: &InstallSource,
        clear: ClearPolicy,
    ) -> InstallResult<InstallSummary> {
        let scratch = self.scratch_dir()?;
        debug!(scratch = %scratch.path().display(), "Created scratch directory");

        let archive_path = match source {
            InstallSource::Remote(version) => self.fetcher.fetch(version, scratch.path())?,
            InstallSource::LocalFile(path) => {
                if !path.is_file() {
                    return Err(InstallError::ArtifactMissing(path.clone()));
                }
                path.clone()
            }
        };
        info!(archive = %archive_path.display(), "Installing package");

        let mut archive = PackageArchive::open(&archive_path)?;
        let manifest = archive.manifest()?;

        let mut summary = InstallSummary::default();
        if clear == ClearPolicy::RemoveExisting {
            summary.removed += self.clear_mods()?;
        }

        let downloads_dir = scratch.path().join("entries");
        for (index, entry) in manifest.entries.iter().enumerate() {
            if !entry.applicability.is_deployable() {
                debug!(
                    path = %entry.path.display(),
                    tag = ?entry.applicability,
                    "Excluded from server"
                );
                summary.excluded += 1;
                continue;
            }

            let dest = self.deploy_root.join(&entry.path);
            if dest.exists() {
                if !existing_matches(&dest, entry) {
                    warn!(
                        path = %entry.path.display(),
                        "Local file differs from the package; keeping local copy"
                    );
                }
                summary.skipped += 1;
                continue;
            }

            let staged = downloads_dir.join(index.to_string());
            match self.deploy_entry(entry, &staged, &dest) {
                Ok(()) => summary.downloaded += 1,
                Err(reason) => {
                    warn!(path = %entry.path.display(), reason = %reason, "Entry failed");
                    summary.failed += 1;
                    summary.failures.push(EntryFailure {
                        path: entry.path.clone(),
                        reason,
                    });
                }
            }
        }

        summary.override_files = archive.extract_overrides(&self.deploy_root)?;
        summary.overrides_applied = summary.override_files > 0;

        if clear == ClearPolicy::PruneStale {
            let mut expected: BTreeSet<PathBuf> = manifest
                .deployable()
                .map(|e| self.deploy_root.join(&e.path))
                .collect();
            expected.extend(
                archive
                    .override_paths()
                    .into_iter()
                    .map(|p| self.deploy_root.join(p)),
            );
            summary.removed += self.prune_stale(&expected)?;
        }

        info!(
            downloaded = summary.downloaded,
            failed = summary.failed,
            skipped = summary.skipped,
            excluded = summary.excluded,
            removed = summary.removed,
            overrides = summary.override_files,
            "Package install finished"
        );
        Ok(summary)
    }

    /// Download one entry to `staged`, verify it, and move it to `dest`.
    ///
    /// URLs are tried in manifest order; the first verified download wins.
    fn deploy_entry(
        &self,
        entry: &PackageManifestEntry,
        staged: &Path,
        dest: &Path,
    ) -> Result<(), String> {
        let mut reasons = Vec::new();
        for url in &entry.downloads {
            match self.download_verified(url, staged, entry) {
                Ok(()) => {
                    return atomic_copy(staged, dest)
                        .map(|_| ())
                        .map_err(|e| e.to_string());
                }
                Err(reason) => {
                    debug!(url = %url, reason = %reason, "Download attempt failed");
                    reasons.push(reason);
                }
            }
        }
        Err(reasons.join("; "))
    }

    fn download_verified(
        &self,
        url: &str,
        staged: &Path,
        entry: &PackageManifestEntry,
    ) -> Result<(), String> {
        self.downloader
            .download(url, staged)
            .map_err(|e: FetchError| e.to_string())?;

        if let Some(expected) = &entry.sha512 {
            let actual = sha512_file(staged).map_err(|e| e.to_string())?;
            if &actual != expected {
                let _ = fs::remove_file(staged);
                return Err(format!("sha512 mismatch for {}", url));
            }
        }
        Ok(())
    }

    fn prune_stale(&self, expected: &BTreeSet<PathBuf>) -> InstallResult<usize> {
        let mods_dir = self.mods_dir();
        let summary = remove_tree(&mods_dir, |p| {
            let is_jar = p.extension().map(|e| e == "jar").unwrap_or(false);
            is_jar && !self.is_protected(p) && !expected.contains(p)
        })?;
        for path in &summary.removed {
            info!(path = %path.display(), "Removed stale mod");
        }
        for (path, reason) in &summary.failed {
            warn!(
                path = %path.display(),
                reason = %reason,
                "Stale mod is locked; remove it after stopping the server"
            );
        }
        Ok(summary.removed_count())
    }

    fn scratch_dir(&self) -> InstallResult<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("localserver-install-");
        let scratch = match &self.scratch_parent {
            Some(dir) => {
                fs::create_dir_all(dir).map_err(InstallError::Scratch)?;
                builder.tempdir_in(dir)
            }
            None => builder.tempdir(),
        };
        scratch.map_err(InstallError::Scratch)
    }
}

/// Whether an existing file satisfies `entry`. Files without a manifest hash
/// always do.
fn existing_matches(path: &Path, entry: &PackageManifestEntry) -> bool {
    match &entry.sha512 {
        None => true,
        Some(expected) => sha512_file(path)
            .map(|actual| &actual == expected)
            .unwrap_or(false),
    }
}

/// Lowercase hex SHA-512 of a file.
pub fn sha512_file(path: &Path) -> std::io::Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha512::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Newest `<prefix>*.mrpack` in `dir` by modification time.
pub fn latest_local_artifact(dir: &Path, prefix: &str) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    entries
        .filter_map(Result::ok)
        .filter(|e| {
            let name = e.file_name().to_string_lossy().into_owned();
            name.starts_with(prefix) && name.ends_with(".mrpack")
        })
        .filter_map(|e| {
            let modified = e.metadata().and_then(|m| m.modified()).ok()?;
            Some((modified, e.path()))
        })
        .max_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)))
        .map(|(_, path)| path)
}

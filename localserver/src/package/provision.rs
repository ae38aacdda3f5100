//! Bridges the installer to the mode manager's mod provisioning seam.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::export::ArtifactExporter;
use super::installer::{
    latest_local_artifact, ClearPolicy, InstallSource, InstallSummary, PackageInstaller,
};
use super::{InstallError, InstallResult};
use crate::fetch::VersionRef;
use crate::mode::ModProvisioner;

/// Pick an install source.
///
/// An explicit version wins. Otherwise the newest exported artifact in
/// `repo_dir` is used. When there is none, `exporter` (if given) is asked to
/// produce one. `fallback_version` is the last resort.
pub fn resolve_source(
    repo_dir: &Path,
    artifact_prefix: &str,
    exporter: Option<&dyn ArtifactExporter>,
    version: Option<VersionRef>,
    fallback_version: Option<VersionRef>,
) -> InstallResult<InstallSource> {
    if let Some(version) = version {
        return Ok(InstallSource::Remote(version));
    }
    if let Some(path) = latest_local_artifact(repo_dir, artifact_prefix) {
        return Ok(InstallSource::LocalFile(path));
    }

    let mut export_error = None;
    if let Some(exporter) = exporter {
        info!(repo = %repo_dir.display(), "No exported package, exporting one");
        match exporter.export(repo_dir) {
            Ok(()) => {
                if let Some(path) = latest_local_artifact(repo_dir, artifact_prefix) {
                    return Ok(InstallSource::LocalFile(path));
                }
                warn!(prefix = artifact_prefix, "Export produced no matching package");
            }
            Err(e) => {
                warn!(error = %e, "Package export failed");
                export_error = Some(e);
            }
        }
    }

    if let Some(version) = fallback_version {
        return Ok(InstallSource::Remote(version));
    }
    Err(export_error.unwrap_or_else(|| InstallError::NoSource {
        dir: repo_dir.to_path_buf(),
        prefix: artifact_prefix.to_string(),
    }))
}

/// [`ModProvisioner`] backed by a [`PackageInstaller`].
///
/// Installs from the newest local artifact (exporting one if needed, else
/// the fallback release) and prunes jars the package no longer ships.
pub struct InstallerProvisioner {
    installer: PackageInstaller,
    repo_dir: PathBuf,
    artifact_prefix: String,
    fallback_version: Option<VersionRef>,
    exporter: Option<Box<dyn ArtifactExporter>>,
}

impl InstallerProvisioner {
    pub fn new(
        installer: PackageInstaller,
        repo_dir: impl Into<PathBuf>,
        artifact_prefix: impl Into<String>,
        fallback_version: Option<VersionRef>,
    ) -> Self {
        Self {
            installer,
            repo_dir: repo_dir.into(),
            artifact_prefix: artifact_prefix.into(),
            fallback_version,
            exporter: None,
        }
    }

    pub fn with_exporter(mut self, exporter: Box<dyn ArtifactExporter>) -> Self {
        self.exporter = Some(exporter);
        self
    }
}

impl ModProvisioner for InstallerProvisioner {
    fn provision(&self) -> InstallResult<InstallSummary> {
        let source = resolve_source(
            &self.repo_dir,
            &self.artifact_prefix,
            self.exporter.as_deref(),
            None,
            self.fallback_version.clone(),
        )?;
        info!(source = ?source, "Provisioning mods");
        self.installer.install(&source, ClearPolicy::PruneStale)
    }
}

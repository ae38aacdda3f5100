//! Error types for package parsing and installation.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::ErrorCategory;
use crate::fetch::FetchError;
use crate::sync::SyncError;

/// Errors raised while parsing a package manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Not JSON, or a required index field is absent or of the wrong type.
    #[error("Malformed manifest: {0}")]
    MalformedManifest(String),

    /// A file entry has no download URL.
    #[error("Manifest entry '{path}' has no download location")]
    MissingDownloadLocation { path: String },

    /// A file entry would be written outside the deployment root.
    #[error("Manifest entry path '{path}' escapes the deployment directory")]
    UnsafePath { path: String },
}

impl ManifestError {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::Manifest
    }
}

/// Errors raised while reading a package archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The archive file could not be opened.
    #[error("Failed to open archive {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a readable zip container.
    #[error("Not a valid package archive {path}: {reason}")]
    InvalidArchive { path: PathBuf, reason: String },

    /// The manifest index file is not in the archive.
    #[error("Archive {path} has no {name}")]
    MissingManifest { path: PathBuf, name: String },

    /// An override entry would be extracted outside the destination.
    #[error("Archive entry '{0}' escapes the destination directory")]
    UnsafeEntry(String),

    /// Reading an entry failed.
    #[error("Failed to read archive entry '{name}': {reason}")]
    Entry { name: String, reason: String },

    /// Writing an extracted file failed.
    #[error(transparent)]
    Sync(#[from] SyncError),
}

impl ArchiveError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ArchiveError::Open { .. } => ErrorCategory::Configuration,
            ArchiveError::Sync(e) => e.category(),
            _ => ErrorCategory::Manifest,
        }
    }
}

/// Errors that abort an installation.
///
/// Per-entry download failures are not errors; they are counted in the
/// install summary.
#[derive(Debug, Error)]
pub enum InstallError {
    /// The requested local artifact does not exist.
    #[error("Package file not found: {0}")]
    ArtifactMissing(PathBuf),

    /// No local artifact was found and no remote version was given.
    #[error("No package to install: no {prefix}*.mrpack in {dir} and no release version given")]
    NoSource { dir: PathBuf, prefix: String },

    /// The export tool could not be launched.
    #[error("Failed to run {program}: {source}")]
    ExportToolMissing {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The export tool ran and did not produce a package.
    #[error("Package export failed: {0}")]
    Export(String),

    /// The scratch directory could not be created.
    #[error("Failed to create scratch directory: {0}")]
    Scratch(std::io::Error),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

impl InstallError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            InstallError::ArtifactMissing(_)
            | InstallError::NoSource { .. }
            | InstallError::ExportToolMissing { .. } => ErrorCategory::Configuration,
            InstallError::Export(_) | InstallError::Scratch(_) => ErrorCategory::Io,
            InstallError::Fetch(e) => e.category(),
            InstallError::Archive(e) => e.category(),
            InstallError::Manifest(e) => e.category(),
            InstallError::Sync(e) => e.category(),
        }
    }
}

/// Result type for installation.
pub type InstallResult<T> = Result<T, InstallError>;

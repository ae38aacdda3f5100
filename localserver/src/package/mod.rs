//! Modpack packages: manifest parsing, archive access and installation.
//!
//! # Overview
//!
//! A package is a Modrinth modpack (`.mrpack`): a zip container holding a
//! `modrinth.index.json` manifest plus optional override trees.
//!
//! - [`parse_manifest`] turns the manifest into [`PackageManifestEntry`]
//!   records with a closed [`Applicability`] tag.
//! - [`PackageArchive`] reads the manifest and extracts `overrides/` and
//!   `server-overrides/`.
//! - [`PackageInstaller`] runs the whole pipeline and reports an
//!   [`InstallSummary`]; entry failures are counted, not fatal.
//! - [`resolve_source`] picks what to install, asking an
//!   [`ArtifactExporter`] for a fresh package when none is exported.

mod archive;
mod error;
mod export;
mod installer;
mod manifest;
mod provision;

pub use archive::{PackageArchive, CLIENT_OVERRIDE_ROOT, SERVER_OVERRIDE_ROOTS};
pub use error::{ArchiveError, InstallError, InstallResult, ManifestError};
pub use export::{ArtifactExporter, PackwizExporter, EXPORT_TIMEOUT};
pub use installer::{
    latest_local_artifact, sha512_file, ClearPolicy, EntryFailure, InstallSource, InstallSummary,
    PackageInstaller, MODS_DIR,
};
pub use manifest::{
    parse_manifest, Applicability, PackageManifest, PackageManifestEntry, MANIFEST_NAME,
};
pub use provision::{resolve_source, InstallerProvisioner};

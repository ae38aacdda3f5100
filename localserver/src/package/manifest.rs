//! Modpack manifest (`modrinth.index.json`) parsing.
//!
//! The raw JSON is deserialized into permissive serde structs and then
//! validated into [`PackageManifest`], so every accepted entry has a safe
//! relative path, at least one download URL and a closed applicability tag.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use super::ManifestError;

/// File name of the manifest at the archive root.
pub const MANIFEST_NAME: &str = "modrinth.index.json";

/// Where a manifest entry is meant to be installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Applicability {
    /// Server only.
    Server,
    /// Client only. Never deployed here.
    Client,
    /// Both sides.
    Both,
    /// Explicitly unsupported on a server. Never deployed here.
    UnsupportedOnServer,
}

impl Applicability {
    /// Whether this system installs entries with this tag.
    pub fn is_deployable(self) -> bool {
        match self {
            Applicability::Server | Applicability::Both => true,
            Applicability::Client | Applicability::UnsupportedOnServer => false,
        }
    }

    fn from_env(env: Option<&RawEnv>) -> Self {
        let Some(env) = env else {
            return Applicability::Both;
        };
        let is_unsupported = |side: &Option<String>| {
            side.as_deref()
                .map(|s| s.eq_ignore_ascii_case("unsupported"))
                .unwrap_or(false)
        };

        if is_unsupported(&env.server) {
            Applicability::UnsupportedOnServer
        } else if is_unsupported(&env.client) {
            Applicability::Server
        } else {
            Applicability::Both
        }
    }
}

/// One file described by a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageManifestEntry {
    /// Relative deployment path, e.g. `mods/lithium-0.11.2.jar`.
    pub path: PathBuf,
    /// Candidate download URLs, in order.
    pub downloads: Vec<String>,
    pub applicability: Applicability,
    /// Expected SHA-512 of the file, lowercase hex.
    pub sha512: Option<String>,
    pub file_size: Option<u64>,
}

/// A parsed manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageManifest {
    pub name: Option<String>,
    pub version_id: Option<String>,
    pub format_version: Option<u32>,
    pub game: Option<String>,
    /// Loader and game versions, e.g. `minecraft` → `1.20.1`.
    pub dependencies: BTreeMap<String, String>,
    pub entries: Vec<PackageManifestEntry>,
}

impl PackageManifest {
    /// Entries this system installs.
    pub fn deployable(&self) -> impl Iterator<Item = &PackageManifestEntry> {
        self.entries.iter().filter(|e| e.applicability.is_deployable())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawManifest {
    format_version: Option<u32>,
    game: Option<String>,
    version_id: Option<String>,
    name: Option<String>,
    files: Option<Vec<RawFile>>,
    dependencies: Option<BTreeMap<String, String>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFile {
    path: Option<String>,
    #[serde(default)]
    downloads: Vec<String>,
    env: Option<RawEnv>,
    #[serde(default)]
    hashes: BTreeMap<String, String>,
    file_size: Option<u64>,
}

#[derive(Deserialize)]
struct RawEnv {
    client: Option<String>,
    server: Option<String>,
}

/// Parse manifest bytes.
///
/// # Errors
///
/// - [`ManifestError::MalformedManifest`] when the bytes are not JSON, or
///   `files` or `dependencies` are absent, or an entry has no `path`.
/// - [`ManifestError::MissingDownloadLocation`] when an entry has no URL.
/// - [`ManifestError::UnsafePath`] when an entry path is absolute or climbs
///   out of the deployment root.
pub fn parse_manifest(bytes: &[u8]) -> Result<PackageManifest, ManifestError> {
    let raw: RawManifest = serde_json::from_slice(bytes)
        .map_err(|e| ManifestError::MalformedManifest(e.to_string()))?;

    let files = raw
        .files
        .ok_or_else(|| ManifestError::MalformedManifest("missing 'files'".to_string()))?;
    let dependencies = raw
        .dependencies
        .ok_or_else(|| ManifestError::MalformedManifest("missing 'dependencies'".to_string()))?;

    let entries = files
        .into_iter()
        .enumerate()
        .map(|(index, file)| parse_entry(index, file))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        name = raw.name.as_deref().unwrap_or("?"),
        version = raw.version_id.as_deref().unwrap_or("?"),
        entries = entries.len(),
        "Parsed manifest"
    );

    Ok(PackageManifest {
        name: raw.name,
        version_id: raw.version_id,
        format_version: raw.format_version,
        game: raw.game,
        dependencies,
        entries,
    })
}

fn parse_entry(index: usize, file: RawFile) -> Result<PackageManifestEntry, ManifestError> {
    let raw_path = file.path.ok_or_else(|| {
        ManifestError::MalformedManifest(format!("files[{}] has no 'path'", index))
    })?;
    let path = safe_relative_path(&raw_path)?;

    let downloads: Vec<String> = file
        .downloads
        .into_iter()
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .collect();
    if downloads.is_empty() {
        return Err(ManifestError::MissingDownloadLocation { path: raw_path });
    }

    Ok(PackageManifestEntry {
        path,
        downloads,
        applicability: Applicability::from_env(file.env.as_ref()),
        sha512: file.hashes.get("sha512").map(|h| h.to_ascii_lowercase()),
        file_size: file.file_size,
    })
}

/// Validate a manifest path: relative, no `..`, no root or prefix.
pub(crate) fn safe_relative_path(raw: &str) -> Result<PathBuf, ManifestError> {
    let unsafe_path = || ManifestError::UnsafePath {
        path: raw.to_string(),
    };

    // Manifests are written with forward slashes; reject backslash tricks
    // regardless of host platform.
    if raw.is_empty() || raw.contains('\\') {
        return Err(unsafe_path());
    }

    let mut clean = PathBuf::new();
    for component in Path::new(raw).components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(unsafe_path())
            }
        }
    }

    if clean.as_os_str().is_empty() {
        return Err(unsafe_path());
    }
    Ok(clean)
}

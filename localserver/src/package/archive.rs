//! Package archive access.
//!
//! Packages are zip containers whatever their extension (`.mrpack`, `.zip`),
//! so the file is opened by content, never by name.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};
use zip::ZipArchive;

use super::manifest::{parse_manifest, PackageManifest, MANIFEST_NAME};
use super::ArchiveError;
use crate::sync::atomic_write_from;

/// Override trees applied to a server, in application order.
pub const SERVER_OVERRIDE_ROOTS: [&str; 2] = ["overrides/", "server-overrides/"];

/// Override tree meant for clients only.
pub const CLIENT_OVERRIDE_ROOT: &str = "client-overrides/";

/// An opened package archive.
pub struct PackageArchive {
    path: PathBuf,
    zip: ZipArchive<File>,
}

impl std::fmt::Debug for PackageArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageArchive")
            .field("path", &self.path)
            .field("entries", &self.zip.len())
            .finish()
    }
}

impl PackageArchive {
    /// Open an archive.
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        let file = File::open(path).map_err(|source| ArchiveError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let zip = ZipArchive::new(file).map_err(|e| ArchiveError::InvalidArchive {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            zip,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw bytes of the manifest index file.
    pub fn manifest_bytes(&mut self) -> Result<Vec<u8>, ArchiveError> {
        let mut entry = self
            .zip
            .by_name(MANIFEST_NAME)
            .map_err(|_| ArchiveError::MissingManifest {
                path: self.path.clone(),
                name: MANIFEST_NAME.to_string(),
            })?;
        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| ArchiveError::Entry {
                name: MANIFEST_NAME.to_string(),
                reason: e.to_string(),
            })?;
        Ok(bytes)
    }

    /// Read and parse the manifest.
    pub fn manifest(&mut self) -> Result<PackageManifest, super::InstallError> {
        let bytes = self.manifest_bytes()?;
        Ok(parse_manifest(&bytes)?)
    }

    /// Relative paths (below the override root) of every server override file.
    pub fn override_paths(&self) -> BTreeSet<PathBuf> {
        let mut paths = BTreeSet::new();
        for name in self.zip.file_names() {
            if name.ends_with('/') {
                continue;
            }
            if let Some(rel) = strip_server_root(name) {
                paths.insert(PathBuf::from(rel));
            }
        }
        paths
    }

    /// Copy `overrides/` and then `server-overrides/` over `dest`.
    ///
    /// Existing files are overwritten, each through a temporary sibling.
    /// `client-overrides/` is ignored. Returns the number of files written.
    ///
    /// # Errors
    ///
    /// [`ArchiveError::UnsafeEntry`] if any override entry would land outside
    /// `dest`; the check runs over all entries before anything is written.
    pub fn extract_overrides(&mut self, dest: &Path) -> Result<usize, ArchiveError> {
        let plan = self.override_plan()?;

        let mut written = 0;
        for (index, relative) in plan {
            let mut entry = self.zip.by_index(index).map_err(|e| ArchiveError::Entry {
                name: relative.display().to_string(),
                reason: e.to_string(),
            })?;
            atomic_write_from(&mut entry, &dest.join(&relative))?;
            written += 1;
        }

        debug!(archive = %self.path.display(), files = written, "Applied overrides");
        Ok(written)
    }

    /// Validated (zip index, relative destination) pairs in application order.
    fn override_plan(&mut self) -> Result<Vec<(usize, PathBuf)>, ArchiveError> {
        let mut plan = Vec::new();
        for root in SERVER_OVERRIDE_ROOTS {
            for index in 0..self.zip.len() {
                let entry = self.zip.by_index(index).map_err(|e| ArchiveError::Entry {
                    name: format!("#{}", index),
                    reason: e.to_string(),
                })?;
                let name = entry.name().to_string();
                if entry.is_dir() || !name.starts_with(root) {
                    continue;
                }

                let enclosed = entry
                    .enclosed_name()
                    .ok_or_else(|| ArchiveError::UnsafeEntry(name.clone()))?;
                let relative = enclosed
                    .strip_prefix(root.trim_end_matches('/'))
                    .map(Path::to_path_buf)
                    .map_err(|_| ArchiveError::UnsafeEntry(name.clone()))?;
                if relative.as_os_str().is_empty() {
                    continue;
                }
                if !relative.components().all(|c| matches!(c, Component::Normal(_))) {
                    return Err(ArchiveError::UnsafeEntry(name));
                }
                plan.push((index, relative));
            }
        }

        if self.zip.file_names().any(|n| n.starts_with(CLIENT_OVERRIDE_ROOT)) {
            warn!(archive = %self.path.display(), "Ignoring client-overrides/");
        }
        Ok(plan)
    }
}

fn strip_server_root(name: &str) -> Option<&str> {
    SERVER_OVERRIDE_ROOTS
        .iter()
        .find_map(|root| name.strip_prefix(root))
        .filter(|rel| !rel.is_empty())
}


#[cfg(test)]
mod tests {
    use super::test_support::write_zip;
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const MANIFEST: &[u8] = br#"{"files": [], "dependencies": {"minecraft": "1.20.1"}}"#;

    #[test]
    fn test_open_rejects_non_zip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("MCC-1.0.0.mrpack");
        fs::write(&path, "definitely not a zip").unwrap();

        assert!(matches!(
            PackageArchive::open(&path),
            Err(ArchiveError::InvalidArchive { .. })
        ));
    }

    #[test]
    fn test_open_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = PackageArchive::open(&temp.path().join("nope.mrpack")).unwrap_err();
        assert!(matches!(err, ArchiveError::Open { .. }));
    }

    #[test]
    fn test_any_extension_is_accepted() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pack.mrpack");
        write_zip(&path, &[(MANIFEST_NAME, MANIFEST)]);

        let mut archive = PackageArchive::open(&path).unwrap();
        let manifest = archive.manifest().unwrap();
        assert_eq!(manifest.dependencies["minecraft"], "1.20.1");
    }

    #[test]
    fn test_missing_manifest() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pack.zip");
        write_zip(&path, &[("overrides/config/a.json", b"{}")]);

        let mut archive = PackageArchive::open(&path).unwrap();
        assert!(matches!(
            archive.manifest_bytes(),
            Err(ArchiveError::MissingManifest { .. })
        ));
    }

    #[test]
    fn test_extract_overrides_order_and_client_ignored() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pack.mrpack");
        write_zip(
            &path,
            &[
                (MANIFEST_NAME, MANIFEST),
                ("server-overrides/config/shared.toml", b"server"),
                ("overrides/config/shared.toml", b"common"),
                ("overrides/mods/bundled.jar", b"jar"),
                ("client-overrides/options.txt", b"client"),
            ],
        );
        let dest = temp.path().join("server");
        fs::create_dir_all(dest.join("config")).unwrap();
        fs::write(dest.join("config").join("shared.toml"), "local").unwrap();

        let mut archive = PackageArchive::open(&path).unwrap();
        let written = archive.extract_overrides(&dest).unwrap();

        assert_eq!(written, 3);
        assert_eq!(
            fs::read_to_string(dest.join("config").join("shared.toml")).unwrap(),
            "server"
        );
        assert_eq!(fs::read(dest.join("mods").join("bundled.jar")).unwrap(), b"jar");
        assert!(!dest.join("options.txt").exists());
    }

    #[test]
    fn test_override_paths() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pack.mrpack");
        write_zip(
            &path,
            &[
                (MANIFEST_NAME, MANIFEST),
                ("overrides/mods/bundled.jar", b"jar"),
                ("client-overrides/mods/zoom.jar", b"jar"),
            ],
        );

        let archive = PackageArchive::open(&path).unwrap();
        let paths = archive.override_paths();
        assert_eq!(paths.len(), 1);
        assert!(paths.contains(&PathBuf::from("mods/bundled.jar")));
    }

    #[test]
    fn test_zip_slip_rejected_before_writing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("evil.mrpack");
        write_zip(
            &path,
            &[
                (MANIFEST_NAME, MANIFEST),
                ("overrides/config/fine.txt", b"ok"),
                ("overrides/../../escaped.txt", b"evil"),
            ],
        );
        let dest = temp.path().join("server");

        let mut archive = PackageArchive::open(&path).unwrap();
        let err = archive.extract_overrides(&dest).unwrap_err();

        assert!(matches!(err, ArchiveError::UnsafeEntry(_)));
        assert!(!dest.join("config").join("fine.txt").exists());
        assert!(!temp.path().join("escaped.txt").exists());
    }
}

//! Copying the modpack's configuration into the server directory.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::sync::{atomic_copy, copy_tree, SyncError, SyncResult};

/// Configuration directory, both in the modpack repository and the server.
pub const CONFIG_DIR: &str = "config";

/// Copy every top-level item of `source` into `dest` and return how many
/// were copied.
///
/// A directory replaces its counterpart in `dest` wholesale; a file is
/// copied over its counterpart atomically. Items only present in `dest`
/// are left alone.
pub fn sync_pack_config(source: &Path, dest: &Path) -> SyncResult<usize> {
    if !source.is_dir() {
        return Err(SyncError::SourceMissing(source.to_path_buf()));
    }
    fs::create_dir_all(dest).map_err(|e| SyncError::io(dest, e))?;

    let mut copied = 0;
    let entries = fs::read_dir(source).map_err(|e| SyncError::io(source, e))?;
    for entry in entries {
        let src = entry.map_err(|e| SyncError::io(source, e))?.path();
        let Some(name) = src.file_name() else {
            continue;
        };
        let dst = dest.join(name);
        if src.is_dir() {
            if dst.exists() {
                fs::remove_dir_all(&dst).map_err(|e| SyncError::io(&dst, e))?;
            }
            copy_tree(&dst, &src)?;
        } else {
            atomic_copy(&src, &dst)?;
        }
        debug!(item = %dst.display(), "Synced config item");
        copied += 1;
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sync_replaces_dirs_and_keeps_extras() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("MCC/config");
        let dest = temp.path().join("server/config");
        fs::create_dir_all(source.join("lithium")).unwrap();
        fs::write(source.join("lithium/mixins.properties"), "new").unwrap();
        fs::write(source.join("sodium-options.json"), "{}").unwrap();
        fs::create_dir_all(dest.join("lithium")).unwrap();
        fs::write(dest.join("lithium/stale.properties"), "old").unwrap();
        fs::write(dest.join("server-only.toml"), "keep").unwrap();

        let copied = sync_pack_config(&source, &dest).unwrap();

        assert_eq!(copied, 2);
        assert_eq!(
            fs::read_to_string(dest.join("lithium/mixins.properties")).unwrap(),
            "new"
        );
        assert!(!dest.join("lithium/stale.properties").exists());
        assert!(dest.join("sodium-options.json").exists());
        assert_eq!(fs::read_to_string(dest.join("server-only.toml")).unwrap(), "keep");
    }

    #[test]
    fn test_missing_source() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            sync_pack_config(&temp.path().join("absent"), &temp.path().join("config")),
            Err(SyncError::SourceMissing(_))
        ));
    }
}

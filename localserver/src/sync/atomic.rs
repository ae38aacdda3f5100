//! Single-file replacement through a temporary sibling and a rename.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use super::{SyncError, SyncResult};

/// Atomically replace `path` with `contents`.
///
/// The bytes are written to a temporary file in the same directory, flushed
/// to disk and renamed over `path`. If anything fails before the rename the
/// temporary file is discarded and `path` is untouched.
pub fn atomic_write(path: &Path, contents: &[u8]) -> SyncResult<()> {
    let parent = parent_dir(path)?;
    fs::create_dir_all(parent).map_err(|e| SyncError::io(parent, e))?;

    let mut temp = NamedTempFile::new_in(parent).map_err(|e| SyncError::io(parent, e))?;
    temp.write_all(contents)
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|e| SyncError::io(temp.path(), e))?;

    temp.persist(path)
        .map_err(|e| SyncError::io(path, e.error))?;
    Ok(())
}

/// Atomically replace `dest` with a copy of `source`.
///
/// Returns the number of bytes copied.
pub fn atomic_copy(source: &Path, dest: &Path) -> SyncResult<u64> {
    if !source.is_file() {
        return Err(SyncError::SourceMissing(source.to_path_buf()));
    }

    let mut reader = File::open(source).map_err(|e| SyncError::io(source, e))?;
    atomic_write_from(&mut reader, dest)
}

/// Atomically replace `dest` with everything `reader` yields.
///
/// Returns the number of bytes written.
pub fn atomic_write_from<R: Read + ?Sized>(reader: &mut R, dest: &Path) -> SyncResult<u64> {
    let parent = parent_dir(dest)?;
    fs::create_dir_all(parent).map_err(|e| SyncError::io(parent, e))?;

    let mut temp = NamedTempFile::new_in(parent).map_err(|e| SyncError::io(parent, e))?;
    let copied = io::copy(reader, temp.as_file_mut())
        .and_then(|n| temp.as_file().sync_all().map(|_| n))
        .map_err(|e| SyncError::io(temp.path(), e))?;

    temp.persist(dest).map_err(|e| SyncError::io(dest, e.error))?;
    Ok(copied)
}

fn parent_dir(path: &Path) -> SyncResult<&Path> {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => Ok(p),
        Some(_) => Ok(Path::new(".")),
        None => Err(SyncError::InvalidPath(path.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write_creates_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("state.txt");

        atomic_write(&path, b"production\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "production\n");
    }

    #[test]
    fn test_atomic_write_replaces_existing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("server.properties");
        fs::write(&path, "level-name=world-fresh\n").unwrap();

        atomic_write(&path, b"level-name=world-local\n").unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "level-name=world-local\n"
        );
        // No temp files left behind
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_atomic_copy() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("a.txt");
        let dest = temp.path().join("b.txt");
        fs::write(&source, "hello").unwrap();
        fs::write(&dest, "old contents").unwrap();

        let copied = atomic_copy(&source, &dest).unwrap();

        assert_eq!(copied, 5);
        assert_eq!(fs::read_to_string(&dest).unwrap(), "hello");
        assert_eq!(fs::read_to_string(&source).unwrap(), "hello");
    }

    #[test]
    fn test_atomic_copy_missing_source_leaves_dest() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("b.txt");
        fs::write(&dest, "keep me").unwrap();

        let result = atomic_copy(&temp.path().join("missing.txt"), &dest);

        assert!(matches!(result, Err(SyncError::SourceMissing(_))));
        assert_eq!(fs::read_to_string(&dest).unwrap(), "keep me");
    }

    #[test]
    fn test_atomic_write_from_reader() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("mods").join("lithium.jar");
        let mut reader = io::Cursor::new(b"jar bytes".to_vec());

        let written = atomic_write_from(&mut reader, &dest).unwrap();

        assert_eq!(written, 9);
        assert_eq!(fs::read(&dest).unwrap(), b"jar bytes");
    }
}

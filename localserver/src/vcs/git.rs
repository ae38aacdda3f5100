//! `git` command-line collaborator.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tracing::debug;

use super::traits::{Revision, ShelfHandle, VersionControl};
use super::{VcsError, VcsResult};

/// Runs `git -C <repo>` for every operation.
#[derive(Debug, Clone)]
pub struct GitCli {
    repo: PathBuf,
    program: String,
}

impl GitCli {
    /// Bind to an existing work tree.
    ///
    /// # Errors
    ///
    /// [`VcsError::NotARepository`] when `repo` has no `.git` entry.
    pub fn open(repo: impl Into<PathBuf>) -> VcsResult<Self> {
        let repo = repo.into();
        if !repo.join(".git").exists() {
            return Err(VcsError::NotARepository(repo));
        }
        Ok(Self {
            repo,
            program: "git".to_string(),
        })
    }

    pub fn repo(&self) -> &Path {
        &self.repo
    }

    fn describe(args: &[&str]) -> String {
        format!("git {}", args.join(" "))
    }

    fn output(&self, args: &[&str]) -> VcsResult<Output> {
        debug!(repo = %self.repo.display(), command = %Self::describe(args), "Running git");
        Command::new(&self.program)
            .arg("-C")
            .arg(&self.repo)
            .args(args)
            .output()
            .map_err(|source| VcsError::Spawn {
                command: Self::describe(args),
                source,
            })
    }

    /// Run and return trimmed stdout, failing on non-zero exit.
    fn run(&self, args: &[&str]) -> VcsResult<String> {
        let output = self.output(args)?;
        if !output.status.success() {
            return Err(VcsError::CommandFailed {
                command: Self::describe(args),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    }

    /// Run and return stdout only on success.
    fn try_run(&self, args: &[&str]) -> VcsResult<Option<String>> {
        let output = self.output(args)?;
        if output.status.success() {
            let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
            Ok(Some(text).filter(|t| !t.is_empty()))
        } else {
            Ok(None)
        }
    }

    fn status_lines(&self) -> VcsResult<Vec<String>> {
        let out = self.run(&["status", "--porcelain"])?;
        Ok(out
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Position of `handle` in `git stash list`.
    fn stash_index(&self, handle: &ShelfHandle) -> VcsResult<usize> {
        let list = self.run(&["stash", "list", "--format=%H"])?;
        list.lines()
            .position(|h| h.trim() == handle.id)
            .ok_or_else(|| VcsError::ShelfNotFound(handle.id.clone()))
    }
}

impl VersionControl for GitCli {
    fn list_tags(&self) -> VcsResult<Vec<String>> {
        let out = self.run(&["tag", "--list"])?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn checkout(&self, reference: &str) -> VcsResult<()> {
        self.run(&["checkout", "-q", reference]).map(|_| ())
    }

    fn has_uncommitted_changes(&self) -> VcsResult<bool> {
        Ok(!self.status_lines()?.is_empty())
    }

    fn shelve(&self, message: &str) -> VcsResult<ShelfHandle> {
        self.run(&["stash", "push", "--include-untracked", "-m", message])?;
        let id = self.run(&["rev-parse", "stash@{0}"])?;
        Ok(ShelfHandle {
            id: id.trim().to_string(),
            message: message.to_string(),
        })
    }

    fn restore_shelf(&self, handle: &ShelfHandle) -> VcsResult<()> {
        let index = self.stash_index(handle)?;
        let entry = format!("stash@{{{}}}", index);
        let args = ["stash", "pop", entry.as_str()];
        let output = self.output(&args)?;
        if output.status.success() {
            return Ok(());
        }
        let mut detail = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if detail.is_empty() {
            detail = String::from_utf8_lossy(&output.stdout).trim().to_string();
        }
        Err(VcsError::RestoreConflict {
            handle: handle.id.clone(),
            detail,
        })
    }

    fn current_revision(&self) -> VcsResult<Revision> {
        if let Some(tag) = self.try_run(&["describe", "--tags", "--exact-match", "HEAD"])? {
            return Ok(Revision::Tag(tag));
        }
        if let Some(branch) = self.try_run(&["symbolic-ref", "--short", "-q", "HEAD"])? {
            return Ok(Revision::Branch(branch));
        }
        let commit = self.run(&["rev-parse", "--short", "HEAD"])?;
        Ok(Revision::Commit(commit.trim().to_string()))
    }

    fn dirty_summary(&self, limit: usize) -> VcsResult<Vec<String>> {
        Ok(self.status_lines()?.into_iter().take(limit).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_requires_repository() {
        let temp = TempDir::new().unwrap();
        let err = GitCli::open(temp.path()).unwrap_err();
        assert!(matches!(err, VcsError::NotARepository(_)));
    }

    #[test]
    fn test_describe_joins_args() {
        assert_eq!(GitCli::describe(&["checkout", "-q", "v1"]), "git checkout -q v1");
    }
}

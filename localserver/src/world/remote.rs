//! Remote file sync collaborator and its rsync adapter.

use std::path::Path;
use std::process::Command;

use tracing::debug;

use super::{WorldSyncError, WorldSyncResult};

/// Auxiliary database files skipped unless explicitly included.
pub const LARGE_FILE_PATTERNS: [&str; 1] = ["DistantHorizons.sqlite*"];

/// Which files a transfer skips.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionPolicy {
    patterns: Vec<String>,
}

impl ExclusionPolicy {
    /// Default policy: large files excluded unless `include_large_files`.
    pub fn new(include_large_files: bool) -> Self {
        let patterns = if include_large_files {
            Vec::new()
        } else {
            LARGE_FILE_PATTERNS.iter().map(|p| p.to_string()).collect()
        };
        Self { patterns }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Match a file name against the patterns. A trailing `*` matches any
    /// suffix.
    pub fn is_excluded(&self, file_name: &str) -> bool {
        self.patterns.iter().any(|p| match p.strip_suffix('*') {
            Some(prefix) => file_name.starts_with(prefix),
            None => file_name == p,
        })
    }
}

/// Mirrors one directory between the remote host and local disk.
pub trait RemoteSync: Send + Sync {
    /// Make `local` a mirror of `remote`.
    fn download(&self, remote: &str, local: &Path, policy: &ExclusionPolicy) -> WorldSyncResult<()>;

    /// Make `remote` a mirror of `local`.
    fn upload(&self, local: &Path, remote: &str, policy: &ExclusionPolicy) -> WorldSyncResult<()>;
}

/// Remote host coordinates.
#[derive(Debug, Clone)]
pub struct RemoteEndpoint {
    pub host: String,
    pub port: u16,
    pub username: String,
}

/// Shells out to `rsync -a` over `ssh -p <port>`.
///
/// Authentication is whatever the user's ssh setup provides.
#[derive(Debug, Clone)]
pub struct RsyncRemoteSync {
    endpoint: RemoteEndpoint,
    program: String,
}

impl RsyncRemoteSync {
    pub fn new(endpoint: RemoteEndpoint) -> Self {
        Self {
            endpoint,
            program: "rsync".to_string(),
        }
    }

    fn remote_spec(&self, remote: &str) -> String {
        format!(
            "{}@{}:{}/",
            self.endpoint.username,
            self.endpoint.host,
            remote.trim_end_matches('/')
        )
    }

    /// Full argument list for one transfer.
    pub fn arguments(&self, from: &str, to: &str, policy: &ExclusionPolicy) -> Vec<String> {
        let mut args = vec![
            "-a".to_string(),
            "--delete".to_string(),
            "-e".to_string(),
            format!("ssh -p {}", self.endpoint.port),
        ];
        for pattern in policy.patterns() {
            args.push(format!("--exclude={}", pattern));
        }
        args.push(from.to_string());
        args.push(to.to_string());
        args
    }

    fn run(&self, remote: &str, args: Vec<String>) -> WorldSyncResult<()> {
        debug!(program = %self.program, args = ?args, "Running transfer");
        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|source| WorldSyncError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        if output.status.success() {
            Ok(())
        } else {
            Err(WorldSyncError::Transfer {
                remote: remote.to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

fn local_spec(local: &Path) -> String {
    format!("{}/", local.display().to_string().trim_end_matches('/'))
}

impl RemoteSync for RsyncRemoteSync {
    fn download(
        &self,
        remote: &str,
        local: &Path,
        policy: &ExclusionPolicy,
    ) -> WorldSyncResult<()> {
        let args = self.arguments(&self.remote_spec(remote), &local_spec(local), policy);
        self.run(remote, args)
    }

    fn upload(&self, local: &Path, remote: &str, policy: &ExclusionPolicy) -> WorldSyncResult<()> {
        let args = self.arguments(&local_spec(local), &self.remote_spec(remote), policy);
        self.run(remote, args)
    }
}

//! Exporting a package from the modpack repository.
//!
//! When the repository has no exported `.mrpack`, one is produced by running
//! `packwiz modrinth export` inside it.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::{InstallError, InstallResult};

/// How long an export may run before it is killed.
pub const EXPORT_TIMEOUT: Duration = Duration::from_secs(120);

/// Stderr characters kept in an export error.
const STDERR_LIMIT: usize = 500;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Produces a fresh package artifact inside the modpack repository.
pub trait ArtifactExporter: Send + Sync {
    fn export(&self, repo_dir: &Path) -> InstallResult<()>;
}

/// Runs `<program> modrinth export` in the repository.
#[derive(Debug, Clone)]
pub struct PackwizExporter {
    program: PathBuf,
    timeout: Duration,
}

impl PackwizExporter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: EXPORT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use `configured` if set, else a packwiz binary shipped in `repo_dir`,
    /// else `packwiz` from `PATH`.
    pub fn locate(repo_dir: &Path, configured: Option<&Path>) -> Self {
        if let Some(program) = configured {
            return Self::new(program);
        }
        let bundled = ["packwiz", "packwiz.exe"]
            .iter()
            .map(|name| repo_dir.join(name))
            .find(|path| path.is_file());
        Self::new(bundled.unwrap_or_else(|| PathBuf::from("packwiz")))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl ArtifactExporter for PackwizExporter {
    fn export(&self, repo_dir: &Path) -> InstallResult<()> {
        info!(
            program = %self.program.display(),
            repo = %repo_dir.display(),
            "Exporting modpack"
        );
        let mut child = Command::new(&self.program)
            .args(["modrinth", "export"])
            .current_dir(repo_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| InstallError::ExportToolMissing {
                program: self.program.clone(),
                source,
            })?;

        let stderr = child.stderr.take();
        let reader = thread::spawn(move || {
            let mut text = String::new();
            if let Some(mut pipe) = stderr {
                let _ = pipe.read_to_string(&mut text);
            }
            text
        });

        let started = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if started.elapsed() >= self.timeout => {
                    warn!(timeout_secs = self.timeout.as_secs(), "Export timed out, killing it");
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(InstallError::Export(format!(
                        "timed out after {}s",
                        self.timeout.as_secs()
                    )));
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => return Err(InstallError::Export(e.to_string())),
            }
        };
        let stderr = reader.join().unwrap_or_default();

        if status.success() {
            debug!(elapsed_ms = started.elapsed().as_millis() as u64, "Export finished");
            return Ok(());
        }
        let detail: String = stderr.trim().chars().take(STDERR_LIMIT).collect();
        Err(InstallError::Export(if detail.is_empty() {
            format!("{} exited with {}", self.program.display(), status)
        } else {
            detail
        }))
    }
}

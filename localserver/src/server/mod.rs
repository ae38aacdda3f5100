//! Game server process collaborator.
//!
//! The server is an opaque child process. This module decides when it may
//! start, probes its port for status, and asks it to stop over RCON.
//! It also sets up LuckPerms so local testers are operators.

mod permissions;

use std::net::{SocketAddr, TcpStream};
use std::path::PathBuf;
use std::process::{Child, Command};
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use crate::error::ErrorCategory;
use crate::rcon::{RconError, RemoteCommand};
use crate::sync::liveness;

pub use permissions::{
    grant_permissions, is_valid_player_name, setup_auto_op, AutoOpSetup, LUCKPERMS_CONFIG,
    LUCKPERMS_GROUPS,
};

/// Timeout of the port probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Errors raised while starting or stopping the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Server is already running on port {0}")]
    AlreadyRunning(u16),

    #[error("Server may be running: lock marker present in {0}")]
    LockPresent(PathBuf),

    #[error("Server is not running")]
    NotRunning,

    #[error("Java not found at {0} (set JAVA_PATH or [server] java_path)")]
    JavaMissing(PathBuf),

    #[error("Server jar not found: {0}")]
    JarMissing(PathBuf),

    #[error("Invalid player name '{0}' (letters, digits and _ only, at most 16)")]
    InvalidPlayerName(String),

    #[error("Failed to launch server: {0}")]
    Spawn(#[source] std::io::Error),

    #[error(transparent)]
    Rcon(#[from] RconError),
}

impl ServerError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ServerError::AlreadyRunning(_) | ServerError::LockPresent(_) => {
                ErrorCategory::DataIntegrityRisk
            }
            ServerError::NotRunning
            | ServerError::JavaMissing(_)
            | ServerError::JarMissing(_)
            | ServerError::InvalidPlayerName(_) => ErrorCategory::Configuration,
            ServerError::Spawn(_) => ErrorCategory::Io,
            ServerError::Rcon(e) => e.category(),
        }
    }
}

/// Launch settings.
#[derive(Debug, Clone)]
pub struct ServerLaunch {
    /// Working directory of the server.
    pub root: PathBuf,
    pub java_path: PathBuf,
    /// Jar path relative to `root`.
    pub server_jar: String,
    pub jvm_args: Vec<String>,
    pub port: u16,
    /// World folder whose lock marker blocks a start.
    pub world_dir: Option<PathBuf>,
}

/// Handle on the game server.
pub struct ServerProcess {
    launch: ServerLaunch,
    remote: Box<dyn RemoteCommand>,
}

impl ServerProcess {
    pub fn new(launch: ServerLaunch, remote: Box<dyn RemoteCommand>) -> Self {
        Self { launch, remote }
    }

    /// Whether something accepts TCP connections on the game port.
    pub fn is_port_open(&self) -> bool {
        let addr = SocketAddr::from(([127, 0, 0, 1], self.launch.port));
        TcpStream::connect_timeout(&addr, PROBE_TIMEOUT).is_ok()
    }

    /// `java <jvm_args> -jar <server_jar> nogui`.
    pub fn command_line(&self) -> Vec<String> {
        let mut args = vec![self.launch.java_path.to_string_lossy().into_owned()];
        args.extend(self.launch.jvm_args.iter().cloned());
        args.extend([
            "-jar".to_string(),
            self.launch.server_jar.clone(),
            "nogui".to_string(),
        ]);
        args
    }

    /// Checks that must pass before a start: not already up, no lock
    /// marker, java and the server jar present.
    pub fn preflight(&self) -> Result<(), ServerError> {
        if self.is_port_open() {
            return Err(ServerError::AlreadyRunning(self.launch.port));
        }
        if let Some(world) = &self.launch.world_dir {
            if liveness(world) {
                return Err(ServerError::LockPresent(world.clone()));
            }
        }
        if !self.launch.java_path.exists() && self.launch.java_path.components().count() > 1 {
            return Err(ServerError::JavaMissing(self.launch.java_path.clone()));
        }
        let jar = self.launch.root.join(&self.launch.server_jar);
        if !jar.is_file() {
            return Err(ServerError::JarMissing(jar));
        }
        Ok(())
    }

    /// Spawn the server in its root directory.
    pub fn start(&self) -> Result<Child, ServerError> {
        self.preflight()?;
        let argv = self.command_line();
        info!(root = %self.launch.root.display(), command = %argv.join(" "), "Starting server");
        Command::new(&argv[0])
            .args(&argv[1..])
            .current_dir(&self.launch.root)
            .spawn()
            .map_err(ServerError::Spawn)
    }

    /// Make `username` an operator through LuckPerms.
    pub fn grant_permissions(&self, username: &str) -> Result<Vec<String>, ServerError> {
        if !self.is_port_open() {
            return Err(ServerError::NotRunning);
        }
        grant_permissions(self.remote.as_ref(), username)
    }

    /// Ask the server to shut down.
    pub fn stop(&self) -> Result<String, ServerError> {
        if !self.is_port_open() {
            return Err(ServerError::NotRunning);
        }
        info!("Sending stop over RCON");
        Ok(self.remote.send("stop")?)
    }
}

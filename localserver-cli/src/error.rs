//! CLI error handling with user-friendly messages.
//!
//! Every library error carries an [`ErrorCategory`]; the CLI prints it with
//! the message and, for version-control errors, a remediation hint.

use std::process;

use console::style;
use thiserror::Error;
use localserver::config::ConfigFileError;
use localserver::error::ErrorCategory;
use localserver::mode::ModeError;
use localserver::package::InstallError;
use localserver::rcon::RconError;
use localserver::server::ServerError;
use localserver::vcs::CheckoutError;
use localserver::world::WorldSyncError;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigFileError),

    #[error("{0}")]
    Usage(String),

    #[error("Cancelled")]
    Cancelled,

    #[error("Prompt failed: {0}")]
    Prompt(String),

    #[error(transparent)]
    Mode(#[from] ModeError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Install(#[from] InstallError),

    #[error(transparent)]
    World(#[from] WorldSyncError),

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error(transparent)]
    Rcon(#[from] RconError),
}

impl CliError {
    pub fn category(&self) -> Option<ErrorCategory> {
        Some(match self {
            CliError::Config(e) => e.category(),
            CliError::Mode(e) => e.category(),
            CliError::Checkout(e) => e.category(),
            CliError::Install(e) => e.category(),
            CliError::World(e) => e.category(),
            CliError::Server(e) => e.category(),
            CliError::Rcon(e) => e.category(),
            _ => return None,
        })
    }

    /// Extra lines printed under the message.
    fn hint(&self) -> Option<String> {
        match self {
            CliError::Checkout(e) => e.remediation(),
            CliError::Mode(ModeError::ProcessMayBeRunning(_))
            | CliError::World(WorldSyncError::ProcessMayBeRunning(_)) => Some(
                "Stop the server first (`localserver stop`). If it is not running, the lock \
                 marker is stale; re-run with --force."
                    .to_string(),
            ),
            CliError::Mode(e) if e.is_recoverable() => Some(
                "The mode was recorded. Fix the cause and run the same `mode` command again."
                    .to_string(),
            ),
            CliError::Install(InstallError::Fetch(_)) => Some(
                "Check [modpack] release_urls in the config file (`localserver config show`)."
                    .to_string(),
            ),
            CliError::Install(InstallError::ExportToolMissing { .. }) => Some(
                "Install packwiz or set [modpack] packwiz in the config file, or pass --version."
                    .to_string(),
            ),
            CliError::Rcon(RconError::NotConfigured) => {
                Some("Set enable-rcon=true and rcon.password in server.properties.".to_string())
            }
            _ => None,
        }
    }

    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        match self {
            CliError::Cancelled => eprintln!("{}", style("Cancelled.").dim()),
            _ => {
                let label = match self.category() {
                    Some(c) => format!("Error ({}):", c),
                    None => "Error:".to_string(),
                };
                eprintln!("{} {}", style(label).red().bold(), self);
                if let Some(hint) = self.hint() {
                    eprintln!();
                    eprintln!("{}", style(hint).yellow());
                }
            }
        }
        process::exit(1)
    }
}

//! `start`, `stop`, `grant` and `rcon` commands.

use console::style;
use localserver::mode::StartPreparation;
use localserver::rcon::RemoteCommand;
use localserver::server::{AutoOpSetup, ServerError};
use tracing::info;

use super::common::{confirm, field, success, warning};
use super::mode::print_mod_action;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Run the server in the foreground until it exits.
///
/// Modes with the full mod set get auto-op configured and missing mods
/// provisioned first. If provisioning fails the user decides whether to
/// start anyway.
pub fn run_start(runner: &CliRunner, assume_yes: bool) -> Result<(), CliError> {
    runner.log_startup("start");
    let server = runner.server()?;
    server.preflight()?;

    let manager = runner.mode_manager();
    if let Some(mode) = manager.active_mode()? {
        println!("Starting server in {} mode...", style(mode).cyan().bold());
    }
    match manager.prepare_start() {
        Ok(prep) => print_preparation(&prep),
        Err(e) if e.is_recoverable() => {
            warning(&e.to_string());
            confirm("Start the server anyway (mods may be missing)?", assume_yes)?;
        }
        Err(e) => return Err(e.into()),
    }
    println!("  {}", style(server.command_line().join(" ")).dim());

    let mut child = server.start()?;
    let status = child.wait().map_err(ServerError::Spawn)?;
    info!(status = %status, "Server exited");
    if status.success() {
        success("Server stopped");
    } else {
        warning(&format!("Server exited with {}", status));
    }
    Ok(())
}

fn print_preparation(prep: &StartPreparation) {
    match prep.auto_op {
        Some(AutoOpSetup::Configured {
            config_updated,
            group_created,
        }) => {
            if config_updated {
                success("LuckPerms configured for auto-op");
            }
            if group_created {
                success("Created default group with operator permissions");
            }
        }
        Some(AutoOpSetup::NotInstalled) => field(
            "Auto-op",
            style("LuckPerms not configured yet; set up on the next start").dim(),
        ),
        None => {}
    }
    if let Some(mods) = &prep.mods {
        print_mod_action(mods);
    }
    for w in &prep.warnings {
        warning(w);
    }
}

/// Make a player operator through LuckPerms.
pub fn run_grant(runner: &CliRunner, username: &str) -> Result<(), CliError> {
    runner.log_startup("grant");
    println!("Granting permissions to {}...", style(username).cyan());
    for reply in runner.server()?.grant_permissions(username)? {
        println!("  {}", style(reply).dim());
    }
    success(&format!("Permissions granted to {}", username));
    println!("  {}", style("The player should rejoin to receive operator status").dim());
    Ok(())
}

pub fn run_stop(runner: &CliRunner) -> Result<(), CliError> {
    runner.log_startup("stop");
    let response = runner.server()?.stop()?;
    if !response.trim().is_empty() {
        println!("  {}", response.trim());
    }
    success("Stop command sent");
    Ok(())
}

/// Send one raw command and print the reply.
pub fn run_rcon(runner: &CliRunner, words: &[String]) -> Result<(), CliError> {
    runner.log_startup("rcon");
    if words.is_empty() {
        return Err(CliError::Usage("no command given".to_string()));
    }
    let response = runner.rcon().send(&words.join(" "))?;
    println!("{}", response);
    Ok(())
}

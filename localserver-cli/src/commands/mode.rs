//! `mode` and `status` commands.

use console::style;
use localserver::mode::{EnvironmentMode, ModAction, SwitchOptions, SwitchReport, WorldAction};
use localserver::vcs::StartupCheck;

use super::common::{field, format_stats, header, print_install_summary, success, warning};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Switch the server directory to `mode`.
pub fn run_switch(
    runner: &CliRunner,
    mode: &str,
    reset: bool,
    force: bool,
) -> Result<(), CliError> {
    runner.log_startup("mode");
    let target: EnvironmentMode = mode.parse()?;
    let manager = runner.mode_manager();

    println!("Switching to {} mode...", style(target).cyan().bold());
    let report = manager.switch_mode(target, SwitchOptions { reset, force })?;
    print_switch_report(&report);
    Ok(())
}

fn print_switch_report(report: &SwitchReport) {
    if let Some(previous) = report.previous {
        field("Previous", previous);
    }
    field("Template", report.template.display());
    if let Some(count) = report.configs_synced {
        field("Configs", format!("{} items synced from the modpack", count));
    }

    let world = match &report.world {
        WorldAction::CopiedFromBackup { files } => {
            format!("working copy created from backup ({} files)", files)
        }
        WorldAction::KeptExisting => "existing world kept".to_string(),
        WorldAction::ResetFromBackup { backups } => format!(
            "working copy rebuilt from backup ({} old folders kept)",
            backups.len()
        ),
        WorldAction::NoBackup => "no backup found; the server will generate a world".to_string(),
        WorldAction::Generated => "the server will generate a new world".to_string(),
    };
    field("World", world);

    print_mod_action(&report.mods);
    if report.updater_toggled {
        field("Auto-updater", "toggled for this mode");
    }
    for w in &report.warnings {
        warning(w);
    }
    success(&format!("Now in {} mode", report.mode));
}

pub(crate) fn print_mod_action(action: &ModAction) {
    match action {
        ModAction::AlreadySatisfied => field("Mods", "already satisfied"),
        ModAction::Pruned(n) => field("Mods", format!("removed {} files", n)),
        ModAction::Installed(summary) => {
            field("Mods", "installed from modpack");
            print_install_summary(summary);
        }
    }
}

/// Show mode, worlds, mods, server and modpack state.
pub fn run_status(runner: &CliRunner) -> Result<(), CliError> {
    runner.log_startup("status");
    let manager = runner.mode_manager();
    let status = manager.status()?;

    header("localserver status");
    field("Server root", runner.root().display());
    match status.active {
        Some(mode) => field("Mode", style(mode).cyan().bold()),
        None => field("Mode", style("unknown").dim()),
    }
    let running = runner.server()?.is_port_open();
    field(
        "Server",
        if running {
            style("running").green()
        } else {
            style("stopped").dim()
        },
    );
    field("Mods", format!("{} jars", status.mod_count));

    println!();
    println!("{}", style("Worlds").bold());
    for world in &status.worlds {
        let detail = if world.present {
            format_stats(&world.stats)
        } else {
            "absent".to_string()
        };
        let live = if world.live { " (locked)" } else { "" };
        println!(
            "  {:<18} {:<12} {}{}",
            world.world.base,
            world.world.role.to_string(),
            detail,
            live
        );
    }

    println!();
    println!("{}", style("Modpack").bold());
    match runner.checkout_manager() {
        Ok((checkout, check)) => {
            let info = checkout.current()?;
            field("Revision", &info.revision);
            field("Phase", checkout.state().phase);
            if !info.dirty.is_empty() {
                field("Local changes", info.dirty.len());
            }
            if let StartupCheck::Inconsistent { phase, target } = check {
                warning(&format!(
                    "Previous switch to {} was interrupted while {}; run `localserver version resolve` once fixed",
                    target, phase
                ));
            }
        }
        Err(e) => field("Repository", style(e).dim()),
    }
    Ok(())
}


//! `world` subcommands: remote sync and world resets.

use clap::Subcommand;
use console::style;
use localserver::mode::{EnvironmentMode, WorldAction};
use localserver::world::{DownloadOptions, UploadOptions};

use super::common::{confirm, field, format_stats, success, warning};
use crate::error::CliError;
use crate::runner::CliRunner;

/// World subcommands.
#[derive(Debug, Subcommand)]
pub enum WorldCommands {
    /// Download the production world from the remote host into the backup
    ///
    /// The previous backup is kept under a timestamped name unless
    /// --no-backup is given.
    Download {
        /// Also transfer large auxiliary database files
        #[arg(long)]
        include_large_files: bool,

        /// Replace the local backup without keeping the old one
        #[arg(long)]
        no_backup: bool,

        /// Proceed even if the world looks in use
        #[arg(long)]
        force: bool,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Stop the remote server and upload the local backup world
    Upload {
        /// Also transfer large auxiliary database files
        #[arg(long)]
        include_large_files: bool,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Delete a mode's generated world (test, fresh or vanilla)
    Reset {
        /// Mode whose world to delete
        mode: String,

        /// Proceed even if the world looks in use
        #[arg(long)]
        force: bool,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Rebuild the production working copy from the backup
    ResetLocal {
        /// Proceed even if the world looks in use
        #[arg(long)]
        force: bool,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Run a world subcommand.
pub fn run(runner: &CliRunner, command: WorldCommands) -> Result<(), CliError> {
    runner.log_startup("world");
    match command {
        WorldCommands::Download {
            include_large_files,
            no_backup,
            force,
            yes,
        } => run_download(
            runner,
            DownloadOptions {
                include_large_files: include_large_files
                    || !runner.config().sync.exclude_large_files,
                no_backup,
                force,
            },
            yes,
        ),
        WorldCommands::Upload {
            include_large_files,
            yes,
        } => run_upload(
            runner,
            UploadOptions {
                include_large_files: include_large_files
                    || !runner.config().sync.exclude_large_files,
            },
            yes,
        ),
        WorldCommands::Reset { mode, force, yes } => run_reset(runner, &mode, force, yes),
        WorldCommands::ResetLocal { force, yes } => run_reset_local(runner, force, yes),
    }
}

fn run_download(runner: &CliRunner, options: DownloadOptions, yes: bool) -> Result<(), CliError> {
    let sync = runner.world_sync(false)?;
    let prompt = if options.no_backup {
        "Replace the local production backup without keeping it?"
    } else {
        "Download the production world? The current backup is kept."
    };
    confirm(prompt, yes)?;

    let results = sync.download(options)?;
    for world in &results {
        println!(
            "  {} {}",
            style(world.local.display()).cyan(),
            format_stats(&world.stats)
        );
        if let Some(previous) = &world.previous {
            field("Kept", previous.display());
        }
    }
    success("World downloaded");
    Ok(())
}

fn run_upload(runner: &CliRunner, options: UploadOptions, yes: bool) -> Result<(), CliError> {
    let sync = runner.world_sync(true)?;
    confirm(
        "Stop the remote server and overwrite its world with the local backup?",
        yes,
    )?;

    let report = sync.upload(options)?;
    if report.stop_sent {
        field("Server", "stop sent");
    } else {
        warning("Could not reach the server over RCON; make sure it is stopped");
    }
    for path in &report.uploaded {
        field("Uploaded", path.display());
    }
    for path in &report.skipped {
        field("Skipped", format!("{} (absent)", path.display()));
    }
    success("World uploaded");
    Ok(())
}

fn run_reset(runner: &CliRunner, mode: &str, force: bool, yes: bool) -> Result<(), CliError> {
    let mode: EnvironmentMode = mode.parse()?;
    confirm(
        &format!("Delete the {} world ({})?", mode, mode.world().base),
        yes,
    )?;
    let deleted = runner.mode_manager().reset_world(mode, force)?;
    if deleted.is_empty() {
        success("Nothing to delete");
    }
    for path in deleted {
        field("Deleted", path.display());
    }
    Ok(())
}

fn run_reset_local(runner: &CliRunner, force: bool, yes: bool) -> Result<(), CliError> {
    confirm(
        "Rebuild the local production world from the backup? The old copy is kept.",
        yes,
    )?;
    match runner.mode_manager().reset_working_copy(force)? {
        WorldAction::ResetFromBackup { backups } => {
            for path in backups {
                field("Kept", path.display());
            }
        }
        WorldAction::CopiedFromBackup { files } => field("Copied", format!("{} files", files)),
        other => field("World", format!("{:?}", other)),
    }
    success("Local production world rebuilt");
    Ok(())
}

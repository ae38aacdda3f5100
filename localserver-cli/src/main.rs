//! localserver CLI - Command-line interface
//!
//! Switches the local server between environment modes, moves the modpack
//! repository between releases, installs modpacks and syncs worlds.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use localserver::config::config_file_path;

use commands::config::ConfigCommands;
use commands::world::WorldCommands;
use error::CliError;
use runner::CliRunner;

#[derive(Parser)]
#[command(name = "localserver")]
#[command(version = localserver::VERSION)]
#[command(
    about = "Manage a local game server: modes, modpack versions and worlds",
    long_about = None
)]
struct Cli {
    /// Configuration file (default: ~/.localserver/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the active mode, worlds, mods and modpack checkout
    Status,

    /// Start the server in the foreground
    ///
    /// In modes with the full mod set, LuckPerms auto-op is configured and
    /// missing mods are installed first.
    Start {
        /// Start even if installing missing mods fails
        #[arg(short, long)]
        yes: bool,
    },

    /// Ask the running server to stop
    Stop,

    /// Switch to an environment mode (test, production, fresh, vanilla)
    Mode {
        /// Mode to switch to
        mode: String,

        /// Rebuild the mode's world (production: re-copy from the backup)
        #[arg(long)]
        reset: bool,

        /// Proceed even if a world looks in use
        #[arg(long)]
        force: bool,
    },

    /// List modpack releases
    Versions,

    /// Show or change the modpack checkout
    ///
    /// TARGET is a release (e.g. 0.9.50 or v0.9.50), `default` to return to
    /// the default branch, or `resolve` after fixing an interrupted switch.
    Version {
        target: Option<String>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,

        /// Install the release's mods after checking it out
        #[arg(long)]
        sync: bool,
    },

    /// Install a modpack into the server directory
    Install {
        /// Release to download
        #[arg(long, conflicts_with = "file")]
        version: Option<String>,

        /// Local .mrpack file
        #[arg(long)]
        file: Option<PathBuf>,

        /// Remove existing mods (except the protected one) first
        #[arg(long)]
        clear: bool,
    },

    /// Remove every mod except the protected one
    ClearMods {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// World sync and resets
    #[command(subcommand)]
    World(WorldCommands),

    /// Give a player every permission through LuckPerms
    Grant {
        /// Player name
        username: String,
    },

    /// Send a command to the server over RCON
    Rcon {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Configuration file management
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let command = match cli.command {
        Commands::Config(command) => {
            let path = cli.config.unwrap_or_else(config_file_path);
            return commands::config::run(command, &path);
        }
        other => other,
    };

    let runner = CliRunner::new(cli.config, cli.debug)?;
    match command {
        Commands::Status => commands::mode::run_status(&runner),
        Commands::Start { yes } => commands::server::run_start(&runner, yes),
        Commands::Stop => commands::server::run_stop(&runner),
        Commands::Mode { mode, reset, force } => {
            commands::mode::run_switch(&runner, &mode, reset, force)
        }
        Commands::Versions => commands::version::run_list(&runner),
        Commands::Version { target, yes, sync } => {
            commands::version::run(&runner, target.as_deref(), yes, sync)
        }
        Commands::Install {
            version,
            file,
            clear,
        } => commands::install::run(&runner, version.as_deref(), file, clear),
        Commands::ClearMods { yes } => commands::install::run_clear(&runner, yes),
        Commands::World(command) => commands::world::run(&runner, command),
        Commands::Grant { username } => commands::server::run_grant(&runner, &username),
        Commands::Rcon { command } => commands::server::run_rcon(&runner, &command),
        // handled before the runner exists
        Commands::Config(_) => Ok(()),
    }
}

//! Configuration management CLI commands.
//!
//! Provides `config path`, `config show` and `config init`. These run
//! without initializing logging so they work before the server root exists.

use std::path::Path;

use clap::Subcommand;
use console::style;
use localserver::config::ConfigFile;

use super::common::{field, header, success};
use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Show effective settings (file plus environment overrides)
    Show,

    /// Write a configuration file with default settings if none exists
    Init,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands, path: &Path) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => {
            println!("{}", path.display());
            Ok(())
        }
        ConfigCommands::Show => run_show(path),
        ConfigCommands::Init => run_init(path),
    }
}

fn run_show(path: &Path) -> Result<(), CliError> {
    let config = ConfigFile::load_from(path)?.with_env_overrides()?;
    if !path.exists() {
        println!(
            "{}",
            style(format!("{} does not exist; showing defaults", path.display())).dim()
        );
        println!();
    }

    header("[server]");
    field("root", config.server.root.display());
    field("java_path", config.server.java_path.display());
    field("server_jar", &config.server.server_jar);
    field("port", config.server.port);
    field("jvm_args", config.server.jvm_args.join(" "));

    println!();
    header("[rcon]");
    field("host", &config.rcon.host);
    field("port", config.rcon.port);
    field("password", redact(config.rcon.password.as_deref()));

    println!();
    header("[modpack]");
    field("repo_dir", config.repo_dir().display());
    field("default_branch", &config.modpack.default_branch);
    field("tag_prefix", &config.modpack.tag_prefix);
    for url in &config.modpack.release_urls {
        field("release_url", url);
    }
    field("artifact", &config.modpack.artifact_glob_prefix);
    field("protected_mod", &config.modpack.protected_mod);
    field("min_mod_count", config.modpack.min_mod_count);
    match &config.modpack.packwiz {
        Some(path) => field("packwiz", path.display()),
        None => field("packwiz", "(auto)"),
    }

    println!();
    header("[sync]");
    field("host", config.sync.host.as_deref().unwrap_or("(not set)"));
    field("port", config.sync.port);
    field("username", config.sync.username.as_deref().unwrap_or("(not set)"));
    field("remote_worlds", config.sync.remote_worlds.join(", "));
    field("exclude_large", config.sync.exclude_large_files);

    println!();
    header("[logging]");
    field("file", config.logging.file.display());
    Ok(())
}

fn run_init(path: &Path) -> Result<(), CliError> {
    if ConfigFile::ensure_exists(path)? {
        success(&format!("Wrote default configuration to {}", path.display()));
        println!("  Edit [server] root and [modpack] repo_dir before first use.");
    } else {
        println!("{} already exists; left unchanged", path.display());
    }
    Ok(())
}

fn redact(secret: Option<&str>) -> &'static str {
    match secret {
        Some(s) if !s.is_empty() => "********",
        _ => "(not set)",
    }
}

//! `install` and `clear-mods` commands.

use std::path::PathBuf;

use console::style;
use localserver::package::{resolve_source, ClearPolicy, InstallSource};

use super::common::{confirm, print_install_summary, success};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Install a modpack into the server directory.
///
/// With neither `version` nor `file`, the newest exported artifact in the
/// modpack repository is used, exporting one first if there is none.
pub fn run(
    runner: &CliRunner,
    version: Option<&str>,
    file: Option<PathBuf>,
    clear: bool,
) -> Result<(), CliError> {
    runner.log_startup("install");
    let source = match (version, file) {
        (Some(_), Some(_)) => {
            return Err(CliError::Usage(
                "--version and --file cannot be used together".to_string(),
            ))
        }
        (None, Some(path)) => InstallSource::LocalFile(path),
        (version, None) => {
            let version = version.map(|v| runner.version_ref(v)).transpose()?;
            let config = runner.config();
            resolve_source(
                &config.repo_dir(),
                &config.modpack.artifact_glob_prefix,
                Some(&runner.exporter()),
                version,
                None,
            )?
        }
    };

    let policy = if clear {
        ClearPolicy::RemoveExisting
    } else {
        ClearPolicy::Keep
    };
    match &source {
        InstallSource::Remote(v) => println!("Installing release {}...", style(v.tag()).cyan()),
        InstallSource::LocalFile(p) => println!("Installing {}...", style(p.display()).cyan()),
    }
    let summary = runner.installer().install(&source, policy)?;
    print_install_summary(&summary);
    Ok(())
}

/// Remove every mod except the protected one.
pub fn run_clear(runner: &CliRunner, assume_yes: bool) -> Result<(), CliError> {
    runner.log_startup("clear-mods");
    let installer = runner.installer();
    confirm(
        &format!(
            "Remove all mods from {} except '{}'?",
            installer.mods_dir().display(),
            runner.config().modpack.protected_mod
        ),
        assume_yes,
    )?;
    let removed = installer.clear_mods()?;
    success(&format!("Removed {} files", removed));
    Ok(())
}

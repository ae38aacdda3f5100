//! Common types and utilities shared across CLI commands.

use console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;
use localserver::package::InstallSummary;
use localserver::sync::DirStats;

use crate::error::CliError;

/// Ask for confirmation unless `assume_yes` is set.
///
/// Declining returns [`CliError::Cancelled`].
pub fn confirm(prompt: &str, assume_yes: bool) -> Result<(), CliError> {
    if assume_yes {
        return Ok(());
    }
    let accepted = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| CliError::Prompt(e.to_string()))?;
    if accepted {
        Ok(())
    } else {
        Err(CliError::Cancelled)
    }
}

pub fn header(title: &str) {
    println!("{}", style(title).bold());
    println!("{}", style("=".repeat(title.len())).dim());
}

pub fn success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

pub fn warning(message: &str) {
    println!("{} {}", style("!").yellow().bold(), style(message).yellow());
}

pub fn field(label: &str, value: impl std::fmt::Display) {
    println!("  {:<14} {}", format!("{}:", label), value);
}

/// Human-readable byte count.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

pub fn format_stats(stats: &DirStats) -> String {
    format!("{} files, {}", stats.files, format_size(stats.bytes))
}

/// Print an install summary, listing per-entry failures.
pub fn print_install_summary(summary: &InstallSummary) {
    field("Downloaded", summary.downloaded);
    field("Already there", summary.skipped);
    field("Client-only", summary.excluded);
    if summary.removed > 0 {
        field("Removed", summary.removed);
    }
    if summary.overrides_applied {
        field("Overrides", format!("{} files", summary.override_files));
    }
    if summary.is_complete() {
        success("Installation complete");
    } else {
        warning(&format!("{} entries could not be installed:", summary.failed));
        for failure in &summary.failures {
            println!("    {} ({})", failure.path.display(), failure.reason);
        }
    }
}

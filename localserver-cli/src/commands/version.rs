//! `versions` and `version` commands: move the modpack repository between
//! release tags.

use console::style;
use localserver::package::{resolve_source, ClearPolicy};
use localserver::vcs::{CheckoutOutcome, Revision, StartupCheck};

use super::common::{confirm, field, header, print_install_summary, success, warning};
use crate::error::CliError;
use crate::runner::{CliCheckoutManager, CliRunner};

/// List release tags, newest first, marking the checked-out one.
pub fn run_list(runner: &CliRunner) -> Result<(), CliError> {
    runner.log_startup("versions");
    let (checkout, _) = runner.checkout_manager()?;
    let current = checkout.current()?;
    let tags = checkout.list_tags()?;

    header("Modpack releases");
    if tags.is_empty() {
        println!("  (no tags)");
    }
    for tag in tags {
        if matches!(&current.revision, Revision::Tag(t) if *t == tag) {
            println!("  {} {}", style("*").green().bold(), style(tag).green());
        } else {
            println!("    {}", tag);
        }
    }
    Ok(())
}

/// `version [target]`.
///
/// No target prints the current revision. `default` returns to the default
/// branch, `resolve` clears an interrupted or conflicted switch, anything
/// else is a release to visit.
pub fn run(
    runner: &CliRunner,
    target: Option<&str>,
    assume_yes: bool,
    sync: bool,
) -> Result<(), CliError> {
    runner.log_startup("version");
    let (mut checkout, check) = runner.checkout_manager()?;

    let Some(target) = target else {
        return show_current(&checkout, &check);
    };

    match target {
        "resolve" => {
            checkout.mark_resolved()?;
            success("Checkout state cleared; the repository is treated as on the default branch");
            return Ok(());
        }
        "default" => {
            let outcome = checkout.request_default()?;
            print_outcome(&outcome);
        }
        requested => {
            let version = runner.version_ref(requested)?;
            let dirty = checkout.current()?.dirty;
            if !dirty.is_empty() {
                warning("Local changes will be shelved until you return to the default branch:");
                for line in &dirty {
                    println!("    {}", line);
                }
                confirm(&format!("Switch to {}?", version.tag()), assume_yes)?;
            }
            let outcome = checkout.request_target(version.tag())?;
            print_outcome(&outcome);

            if sync {
                install_release(runner, &version)?;
            }
        }
    }
    Ok(())
}

fn show_current(checkout: &CliCheckoutManager, check: &StartupCheck) -> Result<(), CliError> {
    let info = checkout.current()?;
    let state = checkout.state();
    header("Modpack checkout");
    field("Revision", &info.revision);
    field("Phase", state.phase);
    if let Some(target) = &state.target {
        field("Target", target);
    }
    field("Shelved", if state.shelved() { "yes" } else { "no" });
    if !info.dirty.is_empty() {
        println!();
        println!("{}", style("Local changes").bold());
        for line in &info.dirty {
            println!("    {}", line);
        }
    }
    if let StartupCheck::Inconsistent { phase, target } = check {
        println!();
        warning(&format!(
            "Previous switch to {} was interrupted while {}",
            target, phase
        ));
    }
    Ok(())
}

fn print_outcome(outcome: &CheckoutOutcome) {
    match outcome {
        CheckoutOutcome::SwitchedToTarget { tag, shelved } => {
            if *shelved {
                field("Shelved", "local changes set aside");
            }
            success(&format!("Checked out {}", tag));
        }
        CheckoutOutcome::ReturnedToDefault { reapplied_shelf } => {
            if *reapplied_shelf {
                field("Shelved", "local changes reapplied");
            }
            success("Back on the default branch");
        }
        CheckoutOutcome::AlreadyThere => success("Already there; nothing to do"),
    }
}

/// Install the release just checked out, pruning jars it does not ship.
fn install_release(
    runner: &CliRunner,
    version: &localserver::fetch::VersionRef,
) -> Result<(), CliError> {
    let config = runner.config();
    let source = resolve_source(
        &config.repo_dir(),
        &config.modpack.artifact_glob_prefix,
        Some(&runner.exporter()),
        None,
        Some(version.clone()),
    )?;
    println!();
    println!("Installing modpack {}...", style(version.tag()).cyan());
    let summary = runner.installer().install(&source, ClearPolicy::PruneStale)?;
    print_install_summary(&summary);
    Ok(())
}

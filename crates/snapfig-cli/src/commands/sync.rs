//! Copy and restore command implementations
//!
//! Copy mirrors the watched paths into the vault; restore brings them back.

use colored::Colorize;
use snapfig_core::{CopyResult, RestoreResult, Service};

use crate::error::{CliError, Result};
use crate::interactive;

/// How `snapfig restore` picks what to restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreScope {
    All,
    Paths(Vec<String>),
    Interactive,
}

/// Run the copy command
pub fn run_copy(service: &impl Service) -> Result<()> {
    if service.config().enabled_entries().next().is_none() {
        return Err(CliError::user(
            "Nothing is watched. Add paths with 'snapfig watch <path>'.",
        ));
    }

    println!(
        "{} Copying watched paths to {}...",
        "=>".blue().bold(),
        service.vault_dir().as_str().cyan()
    );
    let result = service.copy()?;
    print_copy(&result);
    Ok(())
}

fn print_copy(result: &CopyResult) {
    for path in &result.copied {
        println!("   {} {}", "+".green(), path);
    }
    for path in &result.skipped {
        println!("   {} {} {}", "-".yellow(), path, "(not found)".dimmed());
    }
    println!(
        "{} {} updated, {} unchanged, {} removed",
        "OK".green().bold(),
        result.files_updated,
        result.files_skipped,
        result.files_removed
    );
    if let Some(err) = &result.git_error {
        eprintln!("{} vault not committed: {}", "warning:".yellow().bold(), err);
    }
}

/// Run the restore command
///
/// An empty watch list is first rebuilt from the vault manifest and saved,
/// which is how a fresh machine learns what a cloned vault holds.
pub fn run_restore(service: &mut impl Service, scope: RestoreScope) -> Result<()> {
    if service.reconstruct_watching()? {
        service.save_config(None)?;
        println!(
            "{} Adopted {} watched paths from the vault manifest",
            "=>".blue().bold(),
            service.config().watching.len()
        );
    }
    if service.config().enabled_entries().next().is_none() {
        return Err(CliError::user(
            "Nothing to restore. Run 'snapfig pull' or 'snapfig watch <path>' first.",
        ));
    }

    let paths = match scope {
        RestoreScope::All => Vec::new(),
        RestoreScope::Paths(paths) => paths,
        RestoreScope::Interactive => {
            let chosen = interactive::pick_restore_paths(&service.list_vault_entries()?)?;
            if chosen.is_empty() {
                println!("Nothing selected.");
                return Ok(());
            }
            chosen
        }
    };

    let result = if paths.is_empty() {
        service.restore()?
    } else {
        service.restore_selective(&paths)?
    };
    print_restore(&result);
    Ok(())
}

fn print_restore(result: &RestoreResult) {
    for path in &result.restored {
        println!("   {} {}", "+".green(), path);
    }
    for path in &result.skipped {
        println!("   {} {} {}", "-".yellow(), path, "(not in vault)".dimmed());
    }
    println!(
        "{} {} restored, {} unchanged",
        "OK".green().bold(),
        result.files_updated,
        result.files_skipped
    );
}

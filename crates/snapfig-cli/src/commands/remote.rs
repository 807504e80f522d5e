//! Push, pull and remote command implementations

use colored::Colorize;
use snapfig_core::Service;

use crate::error::{CliError, Result};

/// Run the push command
pub fn run_push(service: &impl Service) -> Result<()> {
    println!("{} Pushing vault...", "=>".blue().bold());
    service.push()?;
    println!("{} Vault pushed", "OK".green().bold());
    Ok(())
}

/// Run the pull command
///
/// After a clone the vault manifest tells an empty configuration what to
/// watch, and the result is saved.
pub fn run_pull(service: &mut impl Service) -> Result<()> {
    println!("{} Pulling vault...", "=>".blue().bold());
    let outcome = service.pull()?;

    if outcome.cloned {
        println!(
            "{} Cloned vault into {}",
            "OK".green().bold(),
            service.vault_dir().as_str().cyan()
        );
        if service.reconstruct_watching()? {
            service.save_config(None)?;
            println!(
                "   Adopted {} watched paths. Run {} to apply them.",
                service.config().watching.len(),
                "snapfig restore".cyan()
            );
        }
    } else {
        println!("{} Vault up to date with remote", "OK".green().bold());
    }
    Ok(())
}

/// Run the remote command: print the remote, or set it when `url` is given.
pub fn run_remote(service: &mut impl Service, url: Option<&str>) -> Result<()> {
    let Some(url) = url else {
        let current = service
            .remote_url()?
            .or_else(|| service.config().remote().map(str::to_string));
        match current {
            Some(url) => println!("{url}"),
            None => {
                return Err(CliError::user(
                    "No remote configured. Set one with 'snapfig remote <url>'.",
                ));
            }
        }
        return Ok(());
    };

    service.set_remote(url)?;
    service.save_config(None)?;
    println!("{} Remote set to {}", "OK".green().bold(), url.trim().cyan());
    Ok(())
}

//! Init, watch and unwatch: editing the configuration file

use std::str::FromStr;

use colored::Colorize;
use snapfig_core::{Config, GitPolicy, Service, WatchedEntry};
use snapfig_fs::NormalizedPath;

use crate::error::{CliError, Result};

/// Options gathered from `snapfig init`.
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    pub paths: Vec<String>,
    pub git: String,
    pub vault: Option<String>,
    pub remote: Option<String>,
    pub force: bool,
}

fn parse_policy(value: &str) -> Result<GitPolicy> {
    GitPolicy::from_str(value).map_err(|e| CliError::user(e.to_string()))
}

/// Write a fresh configuration to `config_path`.
pub fn run_init(config_path: &NormalizedPath, options: InitOptions) -> Result<()> {
    if config_path.exists() && !options.force {
        return Err(CliError::user(format!(
            "Configuration already exists at {config_path} (use --force to overwrite)"
        )));
    }

    let config = Config {
        git: parse_policy(&options.git)?,
        remote: options.remote.filter(|r| !r.trim().is_empty()),
        git_token: None,
        vault_path: options.vault,
        watching: options.paths.into_iter().map(WatchedEntry::new).collect(),
        ..Config::default()
    };
    config.validate()?;
    config.save(config_path)?;

    println!(
        "{} Wrote {} ({} watched paths)",
        "OK".green().bold(),
        config_path.as_str().cyan(),
        config.watching.len()
    );
    println!("Run {} to take the first snapshot.", "snapfig copy".cyan());
    Ok(())
}

/// Add `path` to the watch list, or update its policy when already watched.
pub fn run_watch(service: &mut impl Service, path: &str, git: Option<&str>) -> Result<()> {
    let policy = git.map(parse_policy).transpose()?;
    let path = path.trim().trim_end_matches('/').to_string();

    let mut watching = service.config().watching.clone();
    match watching.iter_mut().find(|w| w.path == path) {
        Some(existing) => {
            existing.enabled = true;
            if policy.is_some() {
                existing.git = policy;
            }
        }
        None => watching.push(WatchedEntry {
            path: path.clone(),
            git: policy,
            enabled: true,
        }),
    }
    service.validate_watching(&watching)?;

    service.update_watching(watching);
    service.save_config(None)?;
    println!("{} Watching {}", "+".green(), path.cyan());
    Ok(())
}

/// Drop `path` from the watch list.
pub fn run_unwatch(service: &mut impl Service, path: &str) -> Result<()> {
    let path = path.trim().trim_end_matches('/');
    let mut watching = service.config().watching.clone();
    let before = watching.len();
    watching.retain(|w| w.path != path);

    if watching.len() == before {
        return Err(CliError::user(format!("'{path}' is not watched")));
    }

    service.update_watching(watching);
    service.save_config(None)?;
    println!("{} No longer watching {}", "-".red(), path.cyan());
    Ok(())
}

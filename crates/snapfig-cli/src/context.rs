//! Command context: where the configuration lives and the service built on it

use std::path::PathBuf;

use snapfig_core::{Config, DefaultService, config};
use snapfig_fs::NormalizedPath;

use crate::error::Result;

/// The configuration file to use: `--config` / `SNAPFIG_CONFIG`, or the
/// per-user default.
pub fn config_path(explicit: Option<PathBuf>) -> Result<NormalizedPath> {
    match explicit {
        Some(path) => Ok(NormalizedPath::new(path)),
        None => Ok(config::default_config_path()?),
    }
}

/// Load the configuration at `path`, treating a missing file as empty, and
/// bind it to the user's home and vault directories.
pub fn load_service(path: NormalizedPath) -> Result<DefaultService> {
    let config = Config::load_or_default(&path)?;
    tracing::debug!(config = %path, watching = config.watching.len(), "Loaded context");
    Ok(DefaultService::new(config, path)?)
}

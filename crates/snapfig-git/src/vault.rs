//! git2-backed implementation of [`VersionControl`]

use std::fs;

use git2::{Repository, RepositoryInitOptions};
use git2::build::RepoBuilder;
use snapfig_fs::{NormalizedPath, VaultName};

use crate::helpers::{self, DEFAULT_BRANCH, current_branch};
use crate::remote::effective_remote_url;
use crate::{Error, PullOutcome, Result, VersionControl};

const ORIGIN: &str = "origin";

/// Version control for a vault directory, backed by libgit2.
///
/// Holds only the remote settings from the user configuration; the vault
/// directory is passed to every call.
#[derive(Debug, Clone, Default)]
pub struct GitVault {
    /// Remote to clone from when the vault does not exist yet
    remote: Option<String>,
    /// HTTPS access token, presented as `x-access-token`
    token: Option<String>,
}

impl GitVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remote URL used when a pull has to clone a missing vault.
    pub fn with_remote(mut self, remote: Option<String>) -> Self {
        self.remote = remote.filter(|r| !r.is_empty());
        self
    }

    /// Access token for HTTPS remotes.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    fn is_repo(vault_dir: &NormalizedPath) -> bool {
        vault_dir.join(VaultName::GitDir.as_str()).exists()
    }

    fn open(vault_dir: &NormalizedPath) -> Result<Repository> {
        Ok(Repository::open(vault_dir.to_native())?)
    }

    /// When a token is set and origin is an SSH URL, talk to its HTTPS form.
    fn url_override(&self, repo: &Repository) -> Option<String> {
        let token = self.token.as_deref()?;
        let remote = repo.find_remote(ORIGIN).ok()?;
        let url = remote.url()?;
        let effective = effective_remote_url(url, Some(token));
        (effective != url).then_some(effective)
    }

    fn clone_into(&self, vault_dir: &NormalizedPath, url: &str) -> Result<()> {
        let native = vault_dir.to_native();
        if let Some(parent) = native.parent() {
            fs::create_dir_all(parent).map_err(|e| snapfig_fs::Error::io(parent, e))?;
        }

        let clone_url = effective_remote_url(url, self.token.as_deref());
        let fetch = helpers::fetch_options(git2::Config::open_default().ok(), self.token.as_deref());

        let repo = RepoBuilder::new()
            .fetch_options(fetch)
            .clone(&clone_url, &native)
            .map_err(|e| Error::PullFailed {
                message: format!("Clone failed: {}", e.message()),
            })?;

        // Keep the configured URL as origin, not the token-rewritten one
        if clone_url != url {
            repo.remote_set_url(ORIGIN, url)?;
        }
        Ok(())
    }
}

impl VersionControl for GitVault {
    fn init_repo(&self, vault_dir: &NormalizedPath) -> Result<()> {
        if Self::is_repo(vault_dir) {
            return Ok(());
        }

        let native = vault_dir.to_native();
        fs::create_dir_all(&native).map_err(|e| snapfig_fs::Error::io(&native, e))?;
        let mut options = RepositoryInitOptions::new();
        options.initial_head(DEFAULT_BRANCH);
        Repository::init_opts(&native, &options)?;
        tracing::info!(vault = %vault_dir, "Initialized vault repository");
        Ok(())
    }

    fn commit(&self, vault_dir: &NormalizedPath, message: &str) -> Result<bool> {
        let repo = Self::open(vault_dir)?;
        let mut index = helpers::stage_all(&repo)?;
        helpers::commit_index(&repo, &mut index, message)
    }

    fn has_remote(&self, vault_dir: &NormalizedPath) -> Result<Option<String>> {
        let Ok(repo) = Self::open(vault_dir) else {
            return Ok(None);
        };
        let url = match repo.find_remote(ORIGIN) {
            Ok(remote) => remote.url().map(str::to_string),
            Err(_) => None,
        };
        Ok(url)
    }

    fn push(&self, vault_dir: &NormalizedPath) -> Result<()> {
        if self.has_remote(vault_dir)?.is_none() {
            return Err(Error::NoRemoteConfigured {
                path: vault_dir.to_native(),
            });
        }

        let repo = Self::open(vault_dir)?;
        let branch = current_branch(&repo);
        let url_override = self.url_override(&repo);
        helpers::push(
            &repo,
            url_override.as_deref(),
            &branch,
            self.token.as_deref(),
        )?;

        tracing::info!(vault = %vault_dir, branch = %branch, "Pushed vault");
        Ok(())
    }

    fn pull(&self, vault_dir: &NormalizedPath) -> Result<PullOutcome> {
        if !Self::is_repo(vault_dir) {
            let url = self.remote.as_deref().ok_or_else(|| Error::VaultMissing {
                path: vault_dir.to_native(),
            })?;
            self.clone_into(vault_dir, url)?;
            tracing::info!(vault = %vault_dir, "Cloned vault from remote");
            return Ok(PullOutcome { cloned: true });
        }

        if self.has_remote(vault_dir)?.is_none() {
            return Err(Error::NoRemoteConfigured {
                path: vault_dir.to_native(),
            });
        }

        let repo = Self::open(vault_dir)?;
        let branch = current_branch(&repo);
        let url_override = self.url_override(&repo);
        helpers::pull(
            &repo,
            url_override.as_deref(),
            &branch,
            self.token.as_deref(),
        )?;

        tracing::info!(vault = %vault_dir, branch = %branch, "Pulled vault");
        Ok(PullOutcome { cloned: false })
    }

    fn set_remote(&self, vault_dir: &NormalizedPath, url: &str) -> Result<()> {
        self.init_repo(vault_dir)?;
        let repo = Self::open(vault_dir)?;

        match self.has_remote(vault_dir)? {
            Some(current) if current == url => return Ok(()),
            Some(_) => repo.remote_set_url(ORIGIN, url)?,
            None => {
                repo.remote(ORIGIN, url)?;
            }
        }

        tracing::info!(vault = %vault_dir, url = %url, "Configured vault remote");
        Ok(())
    }
}

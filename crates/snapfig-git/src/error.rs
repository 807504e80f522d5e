//! Error types for snapfig-git

use std::path::PathBuf;

/// Result type for snapfig-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in snapfig-git operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Filesystem error: {0}")]
    Fs(#[from] snapfig_fs::Error),

    #[error("Remote '{name}' not found")]
    RemoteNotFound { name: String },

    #[error("No remote configured for vault at {path}. Run: snapfig remote <url>")]
    NoRemoteConfigured { path: PathBuf },

    #[error("Vault at {path} is not a git repository and no remote is configured to clone from")]
    VaultMissing { path: PathBuf },

    #[error("Push failed: {message}")]
    PushFailed { message: String },

    #[error("Pull failed: {message}")]
    PullFailed { message: String },

    #[error("{message}")]
    CannotFastForward { message: String },
}

//! Error types for snapfig-core

use std::path::PathBuf;

/// Result type for snapfig-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in snapfig-core operations
///
/// A missing source or vault path is never an error; copy and restore record
/// it in their `skipped` lists instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Filesystem failure while mirroring; aborts the whole operation
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A failure while processing one watched entry
    #[error("Failed to sync {path}: {source}")]
    Entry {
        path: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Manifest not found in vault at {path}")]
    ManifestNotFound { path: PathBuf },

    #[error("Failed to parse manifest at {path}: {message}")]
    ManifestParse { path: PathBuf, message: String },

    /// Configuration file not found at expected path
    #[error("Configuration not found at {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Invalid git policy: {value} (expected 'disable' or 'remove')")]
    InvalidGitPolicy { value: String },

    #[error("Could not determine the home directory")]
    HomeDirUnavailable,

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from snapfig-fs
    #[error(transparent)]
    Fs(#[from] snapfig_fs::Error),

    /// Version control error from snapfig-git
    #[error(transparent)]
    Git(#[from] snapfig_git::Error),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Attach the watched entry being processed when this error occurred.
    pub fn in_entry(self, path: impl Into<String>) -> Self {
        Self::Entry {
            path: path.into(),
            source: Box::new(self),
        }
    }
}

impl From<walkdir::Error> for Error {
    fn from(e: walkdir::Error) -> Self {
        let path = e.path().map(PathBuf::from).unwrap_or_default();
        Self::Io {
            path,
            source: e.into(),
        }
    }
}

//! Vault synchronization engine for snapfig
//!
//! Mirrors a watch list of home-relative paths into a vault directory and
//! back again:
//!
//! - **Copier**: origin to vault, with incremental diffing, stale removal,
//!   `.git` policy transforms and symlink markers; writes the manifest
//! - **Restorer**: vault to origin, whole-tree or selective, with the vault
//!   treated as authoritative
//! - **Manifest**: the vault-root record that lets a cloned vault rebuild its
//!   own watch list
//! - **Daemon**: a blocking loop running copy, push and pull on intervals
//!
//! ```text
//!            snapfig-cli
//!                 |
//!           snapfig-core
//!            /         \
//!     snapfig-fs   snapfig-git
//! ```
//!
//! Calls are synchronous and expect one operation per vault at a time.

pub mod config;
pub mod daemon;
pub mod error;
pub mod manifest;
pub mod selection;
pub mod service;
pub mod sync;

pub use config::{Config, DaemonConfig, GitPolicy, WatchedEntry};
pub use daemon::{Daemon, Schedule, Task};
pub use error::{Error, Result};
pub use manifest::{CopiedItem, MANIFEST_VERSION, Manifest, ManifestEntry};
pub use selection::{NodeId, SelectionState, SelectionTree};
pub use service::{DefaultService, Service};
pub use sync::{CopyResult, Copier, RestoreResult, Restorer, TransferStats, VaultEntry};

//! Mirroring between the home directory and the vault
//!
//! - [`Copier`]: origin to vault, only overwriting with fresher data
//! - [`Restorer`]: vault to origin, the vault always wins
//! - [`transfer`]: the name mapping and freshness rules both directions share

pub mod copier;
pub mod restorer;
pub mod transfer;

pub use copier::{CopyResult, Copier, commit_message};
pub use restorer::{RestoreResult, Restorer, VaultEntry};
pub use transfer::{EntryKind, TransferStats, destination_name, restored_name};

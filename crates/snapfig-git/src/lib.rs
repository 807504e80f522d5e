//! Version control for the snapfig vault
//!
//! The engine only talks to the [`VersionControl`] trait; [`GitVault`] is the
//! `git2`-backed implementation. Every operation takes the vault directory
//! explicitly so one value can serve any vault.

pub mod error;
pub mod helpers;
pub mod remote;
pub mod vault;
pub mod vcs;

pub use error::{Error, Result};
pub use vault::GitVault;
pub use vcs::{PullOutcome, VersionControl};

//! Shared test utilities for the snapfig workspace.
//!
//! Dev-dependency only, never published.
//!
//! - [`git`] builds git repositories for vault and remote fixtures
//! - [`sandbox`] provides [`Sandbox`], a temporary home + vault pair

pub mod git;
pub mod sandbox;

pub use sandbox::Sandbox;

//! Filesystem primitives for snapfig
//!
//! Provides normalized path handling, atomic writes, format-agnostic
//! configuration storage, the runner's PID lock and the well-known names
//! used inside a vault.

pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod lock;
pub mod path;

pub use config::ConfigStore;
pub use constants::VaultName;
pub use error::{Error, Result};
pub use lock::{PidLock, running_pid};
pub use path::{NormalizedPath, validate_relative_path};

//! Command implementations for snapfig-cli

pub mod daemon;
pub mod init;
pub mod list;
pub mod remote;
pub mod sync;

pub use daemon::{run_daemon_run, run_daemon_start, run_daemon_status, run_daemon_stop};
pub use init::{InitOptions, run_init, run_unwatch, run_watch};
pub use list::run_list;
pub use remote::{run_pull, run_push, run_remote};
pub use sync::{RestoreScope, run_copy, run_restore};

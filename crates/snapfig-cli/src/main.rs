//! snapfig CLI
//!
//! Back up dotfiles into a git-tracked vault, push it, and restore it on
//! another machine.

mod cli;
mod commands;
mod context;
mod error;
mod interactive;

use clap::{CommandFactory, Parser};
use colored::Colorize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands, DaemonCommand};
use commands::{InitOptions, RestoreScope};
use error::{CliError, Result};

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Some(cmd) => execute_command(cmd, cli.config),
        None => {
            println!("{} dotfile vault", "snapfig".green().bold());
            println!();
            println!("Run {} for available commands.", "snapfig --help".cyan());
            Ok(())
        }
    }
}

/// Log to stderr. `RUST_LOG` wins; otherwise `info`, or `debug` with
/// `--verbose`.
fn init_logging(verbose: bool) -> Result<()> {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default))
        .map_err(|e| CliError::user(format!("invalid log filter: {e}")))?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| CliError::user(format!("failed to set up logging: {e}")))?;

    tracing::debug!("Verbose mode enabled");
    Ok(())
}

fn execute_command(cmd: Commands, config: Option<std::path::PathBuf>) -> Result<()> {
    let config_path = context::config_path(config)?;

    match cmd {
        Commands::Init {
            paths,
            git,
            vault,
            remote,
            force,
        } => commands::run_init(
            &config_path,
            InitOptions {
                paths,
                git,
                vault,
                remote,
                force,
            },
        ),
        Commands::Watch { path, git } => {
            let mut service = context::load_service(config_path)?;
            commands::run_watch(&mut service, &path, git.as_deref())
        }
        Commands::Unwatch { path } => {
            let mut service = context::load_service(config_path)?;
            commands::run_unwatch(&mut service, &path)
        }
        Commands::Copy => commands::run_copy(&context::load_service(config_path)?),
        Commands::Restore { paths, interactive } => {
            let scope = if interactive {
                RestoreScope::Interactive
            } else if paths.is_empty() {
                RestoreScope::All
            } else {
                RestoreScope::Paths(paths)
            };
            let mut service = context::load_service(config_path)?;
            commands::run_restore(&mut service, scope)
        }
        Commands::List { long } => {
            let mut service = context::load_service(config_path)?;
            commands::run_list(&mut service, long)
        }
        Commands::Push => commands::run_push(&context::load_service(config_path)?),
        Commands::Pull => {
            let mut service = context::load_service(config_path)?;
            commands::run_pull(&mut service)
        }
        Commands::Remote { url } => {
            let mut service = context::load_service(config_path)?;
            commands::run_remote(&mut service, url.as_deref())
        }
        Commands::Daemon { command } => {
            let pid_path = snapfig_core::config::default_pid_path()?;
            match command {
                DaemonCommand::Start => {
                    let service = context::load_service(config_path.clone())?;
                    let log_path = snapfig_core::config::default_log_path()?;
                    commands::run_daemon_start(&service, &config_path, &pid_path, &log_path)
                }
                DaemonCommand::Stop => commands::run_daemon_stop(&pid_path),
                DaemonCommand::Status => {
                    let service = context::load_service(config_path)?;
                    commands::run_daemon_status(&service, &pid_path)
                }
                DaemonCommand::Run => {
                    commands::run_daemon_run(context::load_service(config_path)?, &pid_path)
                }
            }
        }
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "snapfig",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    }
}

//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// snapfig - Back up dotfiles into a git-tracked vault and restore them anywhere
#[derive(Parser, Debug)]
#[command(name = "snapfig")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file [default: ~/.config/snapfig/config.yml]
    #[arg(long, global = true, env = "SNAPFIG_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Create a configuration file
    ///
    /// Examples:
    ///   snapfig init .config/nvim .bashrc
    ///   snapfig init --git remove --remote git@github.com:me/dotfiles.git
    Init {
        /// Paths relative to the home directory to watch
        paths: Vec<String>,

        /// Default handling of nested .git directories (disable or remove)
        #[arg(long, default_value = "disable")]
        git: String,

        /// Vault directory [default: ~/.snapfig/vault]
        #[arg(long, value_name = "DIR")]
        vault: Option<String>,

        /// Remote repository URL for push and pull
        #[arg(short, long)]
        remote: Option<String>,

        /// Overwrite an existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Start watching a path
    Watch {
        /// Path relative to the home directory
        path: String,

        /// Handling of nested .git directories for this path
        #[arg(long)]
        git: Option<String>,
    },

    /// Stop watching a path; its vault copy is removed on the next copy
    Unwatch {
        /// Path relative to the home directory
        path: String,
    },

    /// Mirror watched paths into the vault and commit
    Copy,

    /// Restore watched paths from the vault
    ///
    /// Examples:
    ///   snapfig restore                          # everything
    ///   snapfig restore .config/nvim/init.lua    # one file
    ///   snapfig restore --interactive            # pick from a tree
    Restore {
        /// Vault-relative paths to restore; all watched paths when empty
        paths: Vec<String>,

        /// Choose what to restore interactively
        #[arg(short, long, conflicts_with = "paths")]
        interactive: bool,
    },

    /// List watched paths present in the vault
    List {
        /// Also list files beneath each directory
        #[arg(short, long)]
        long: bool,
    },

    /// Push the vault to its remote
    Push,

    /// Pull the vault from its remote, cloning it if absent
    Pull,

    /// Show or set the vault remote
    Remote {
        /// New remote URL
        url: Option<String>,
    },

    /// Copy, push and pull in the background on the configured intervals
    ///
    /// Examples:
    ///   snapfig daemon start
    ///   snapfig daemon status
    Daemon {
        #[command(subcommand)]
        command: DaemonCommand,
    },

    /// Generate shell completions
    ///
    /// Examples:
    ///   snapfig completions bash > ~/.local/share/bash-completion/completions/snapfig
    ///   snapfig completions zsh > ~/.zfunc/_snapfig
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Background runner control
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum DaemonCommand {
    /// Start the runner detached, logging to ~/.snapfig/daemon.log
    Start,

    /// Ask the running runner to stop
    Stop,

    /// Show whether the runner is alive and its intervals
    Status,

    /// Run in the foreground until interrupted
    #[command(hide = true)]
    Run,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_no_command() {
        let cli = Cli::parse_from(["snapfig"]);
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["snapfig", "copy", "-v", "--config", "/tmp/c.yml"]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.yml")));
        assert_eq!(cli.command, Some(Commands::Copy));
    }

    #[test]
    fn parse_init_defaults() {
        let cli = Cli::parse_from(["snapfig", "init", ".bashrc", ".config/nvim"]);
        assert_eq!(
            cli.command,
            Some(Commands::Init {
                paths: vec![".bashrc".into(), ".config/nvim".into()],
                git: "disable".into(),
                vault: None,
                remote: None,
                force: false,
            })
        );
    }

    #[test]
    fn parse_restore_paths() {
        let cli = Cli::parse_from(["snapfig", "restore", ".config/nvim/init.lua"]);
        assert_eq!(
            cli.command,
            Some(Commands::Restore {
                paths: vec![".config/nvim/init.lua".into()],
                interactive: false,
            })
        );
    }

    #[test]
    fn parse_restore_interactive_conflicts_with_paths() {
        let result = Cli::try_parse_from(["snapfig", "restore", "-i", ".bashrc"]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_remote_without_url() {
        let cli = Cli::parse_from(["snapfig", "remote"]);
        assert_eq!(cli.command, Some(Commands::Remote { url: None }));
    }

    #[test]
    fn parse_watch_with_policy() {
        let cli = Cli::parse_from(["snapfig", "watch", ".config/fish", "--git", "remove"]);
        assert_eq!(
            cli.command,
            Some(Commands::Watch {
                path: ".config/fish".into(),
                git: Some("remove".into()),
            })
        );
    }

    #[test]
    fn parse_completions_command() {
        let cli = Cli::parse_from(["snapfig", "completions", "bash"]);
        assert!(matches!(cli.command, Some(Commands::Completions { .. })));
    }

    #[test]
    fn parse_daemon_subcommands() {
        let cli = Cli::parse_from(["snapfig", "daemon", "status"]);
        assert_eq!(
            cli.command,
            Some(Commands::Daemon {
                command: DaemonCommand::Status
            })
        );

        let cli = Cli::parse_from(["snapfig", "daemon", "run"]);
        assert_eq!(
            cli.command,
            Some(Commands::Daemon {
                command: DaemonCommand::Run
            })
        );
    }

    #[test]
    fn parse_daemon_requires_subcommand() {
        assert!(Cli::try_parse_from(["snapfig", "daemon"]).is_err());
    }
}

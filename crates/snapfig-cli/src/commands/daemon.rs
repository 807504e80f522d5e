//! Background runner commands: start, stop, status and the hidden run

use std::fs::{self, OpenOptions};
use std::process::{Command, Stdio};
use std::sync::atomic::AtomicBool;
use std::time::Instant;

use colored::Colorize;
use snapfig_core::{Daemon, Schedule, Service};
use snapfig_fs::{NormalizedPath, PidLock, running_pid};

use crate::error::{CliError, Result};

/// Set from the signal handler; the runner checks it between sleeps.
static STOP: AtomicBool = AtomicBool::new(false);

/// Run the schedule in the foreground while holding the PID lock.
pub fn run_daemon_run(service: impl Service, pid_path: &NormalizedPath) -> Result<()> {
    let mut daemon = Daemon::new(service)?;
    let lock = PidLock::acquire(pid_path).map_err(|e| match e {
        snapfig_fs::Error::AlreadyRunning { pid: Some(pid), .. } => {
            CliError::user(format!("Daemon already running (pid {pid})"))
        }
        other => other.into(),
    })?;
    install_stop_handlers()?;

    tracing::info!(pid = lock.pid(), pid_file = %pid_path, "Holding PID lock");
    daemon.run(&STOP);
    Ok(())
}

/// Spawn `snapfig daemon run` detached from the terminal, appending its
/// output to `log_path`.
pub fn run_daemon_start(
    service: &impl Service,
    config_path: &NormalizedPath,
    pid_path: &NormalizedPath,
    log_path: &NormalizedPath,
) -> Result<()> {
    if let Some(pid) = running_pid(pid_path)? {
        return Err(CliError::user(format!("Daemon already running (pid {pid})")));
    }
    let schedule = Schedule::new(&service.config().daemon, Instant::now())?;
    if schedule.is_empty() {
        return Err(CliError::user(
            "No intervals configured. Set daemon.copy_interval in the configuration first.",
        ));
    }

    let log_native = log_path.to_native();
    if let Some(parent) = log_native.parent() {
        fs::create_dir_all(parent)?;
    }
    let log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_native)?;

    let mut command = Command::new(std::env::current_exe()?);
    command
        .arg("--config")
        .arg(config_path.to_native())
        .args(["daemon", "run"])
        .stdin(Stdio::null())
        .stdout(log.try_clone()?)
        .stderr(log);
    detach(&mut command);

    let child = command.spawn()?;
    println!("{} Daemon started (pid {})", "OK".green().bold(), child.id());
    println!("   Logging to {}", log_path.as_str().cyan());
    Ok(())
}

/// Ask the running daemon to finish its current task and exit.
pub fn run_daemon_stop(pid_path: &NormalizedPath) -> Result<()> {
    let Some(pid) = running_pid(pid_path)? else {
        println!("Daemon is not running");
        return Ok(());
    };

    request_stop(pid)?;
    println!("{} Daemon stopping (pid {pid})", "OK".green().bold());
    Ok(())
}

/// Report whether a daemon holds the lock, then the configured intervals.
pub fn run_daemon_status(service: &impl Service, pid_path: &NormalizedPath) -> Result<()> {
    match running_pid(pid_path)? {
        Some(pid) => println!("{} Daemon is running (pid {pid})", "OK".green().bold()),
        None => println!("Daemon is not running"),
    }

    let settings = &service.config().daemon;
    match Schedule::new(settings, Instant::now()) {
        Ok(schedule) => {
            for (task, interval) in schedule.intervals() {
                println!("  {task} every {}", humanize(interval).cyan());
            }
            if settings.auto_restore {
                println!("  restore after each pull");
            }
        }
        Err(e) => println!("  {} {e}", "warning:".yellow().bold()),
    }
    Ok(())
}

fn humanize(interval: std::time::Duration) -> String {
    let secs = interval.as_secs();
    match (secs, interval.subsec_millis()) {
        (0, ms) => format!("{ms}ms"),
        (s, 0) if s % 3600 == 0 => format!("{}h", s / 3600),
        (s, 0) if s % 60 == 0 => format!("{}m", s / 60),
        (s, 0) => format!("{s}s"),
        _ => format!("{}ms", interval.as_millis()),
    }
}

#[cfg(unix)]
fn detach(command: &mut Command) {
    use std::os::unix::process::CommandExt;
    command.process_group(0);
}

#[cfg(not(unix))]
fn detach(_command: &mut Command) {}

#[cfg(unix)]
extern "C" fn on_stop_signal(_: nix::libc::c_int) {
    STOP.store(true, std::sync::atomic::Ordering::SeqCst);
}

#[cfg(unix)]
fn install_stop_handlers() -> Result<()> {
    use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};

    let action = SigAction::new(
        SigHandler::Handler(on_stop_signal),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    for signal in [Signal::SIGTERM, Signal::SIGINT] {
        // SAFETY: the handler only stores to an atomic.
        unsafe { sigaction(signal, &action) }
            .map_err(|e| CliError::user(format!("failed to install {signal} handler: {e}")))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn install_stop_handlers() -> Result<()> {
    // The process ends on Ctrl+C and the OS releases the lock.
    Ok(())
}

#[cfg(unix)]
fn request_stop(pid: u32) -> Result<()> {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let raw = i32::try_from(pid).map_err(|_| CliError::user(format!("invalid pid {pid}")))?;
    kill(Pid::from_raw(raw), Signal::SIGTERM)
        .map_err(|e| CliError::user(format!("failed to stop daemon (pid {pid}): {e}")))
}

#[cfg(not(unix))]
fn request_stop(pid: u32) -> Result<()> {
    Err(CliError::user(format!(
        "Stopping the daemon is not supported on this platform; end process {pid} directly"
    )))
}

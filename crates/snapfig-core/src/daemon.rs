//! Background runner: copy, push and pull on fixed intervals
//!
//! The runner is a plain blocking loop over a [`Service`]. It is the single
//! caller of copy and restore while it runs, which keeps those calls
//! serialized; the front-end holds a PID lock for the same lifetime so a
//! second runner cannot start.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::DaemonConfig;
use crate::service::Service;
use crate::{Error, Result};

/// Longest single sleep, so a stop request is noticed promptly.
const POLL: Duration = Duration::from_millis(250);

/// Parse a `1h30m` style interval. Units are `ms`, `s`, `m` and `h`, amounts
/// may carry a fraction, and a bare `0` is accepted.
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`] for anything else.
pub fn parse_interval(value: &str) -> Result<Duration> {
    let invalid = |reason: &str| Error::InvalidConfig {
        message: format!("invalid interval '{value}': {reason}"),
    };

    let text = value.trim();
    if text.is_empty() {
        return Err(invalid("empty"));
    }
    if text == "0" {
        return Ok(Duration::ZERO);
    }

    let is_number = |c: char| c.is_ascii_digit() || c == '.';
    let mut total = Duration::ZERO;
    let mut rest = text;
    while !rest.is_empty() {
        let (number, tail) = rest.split_at(rest.find(|c| !is_number(c)).unwrap_or(rest.len()));
        let (unit, tail) = tail.split_at(tail.find(is_number).unwrap_or(tail.len()));

        let amount: f64 = number.parse().map_err(|_| invalid("expected a number"))?;
        let scale = match unit {
            "ms" => 0.001,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            "" => return Err(invalid("missing unit")),
            _ => return Err(invalid("unknown unit")),
        };
        total += Duration::try_from_secs_f64(amount * scale).map_err(|_| invalid("out of range"))?;
        rest = tail;
    }
    Ok(total)
}

/// A scheduled operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Copy,
    Push,
    Pull,
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::Copy => write!(f, "copy"),
            Task::Push => write!(f, "push"),
            Task::Pull => write!(f, "pull"),
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    task: Task,
    interval: Duration,
    next: Instant,
}

/// When each task is next due. A task first runs one interval after the
/// schedule is built; ticks missed while a task was running are dropped.
#[derive(Debug, Clone)]
pub struct Schedule {
    slots: Vec<Slot>,
}

impl Schedule {
    /// Build from `settings`, leaving out unset or zero intervals.
    pub fn new(settings: &DaemonConfig, now: Instant) -> Result<Self> {
        let configured = [
            (Task::Copy, &settings.copy_interval),
            (Task::Push, &settings.push_interval),
            (Task::Pull, &settings.pull_interval),
        ];

        let mut slots = Vec::new();
        for (task, value) in configured {
            let Some(value) = value else { continue };
            let interval = parse_interval(value).map_err(|e| match e {
                Error::InvalidConfig { message } => Error::InvalidConfig {
                    message: format!("{task}_interval: {message}"),
                },
                other => other,
            })?;
            if !interval.is_zero() {
                slots.push(Slot {
                    task,
                    interval,
                    next: now + interval,
                });
            }
        }
        Ok(Self { slots })
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Configured tasks and their intervals, in copy, push, pull order.
    pub fn intervals(&self) -> impl Iterator<Item = (Task, Duration)> + '_ {
        self.slots.iter().map(|s| (s.task, s.interval))
    }

    /// Tasks due at `now`, in copy, push, pull order; each is rescheduled.
    pub fn due(&mut self, now: Instant) -> Vec<Task> {
        let mut due = Vec::new();
        for slot in &mut self.slots {
            if now >= slot.next {
                due.push(slot.task);
                slot.next = now + slot.interval;
            }
        }
        due
    }

    /// The earliest upcoming deadline.
    pub fn next_due(&self) -> Option<Instant> {
        self.slots.iter().map(|s| s.next).min()
    }

    /// Adopt new intervals, keeping the deadline of any task whose interval
    /// is unchanged. Returns whether anything changed.
    pub fn reschedule(&mut self, settings: &DaemonConfig, now: Instant) -> Result<bool> {
        let mut fresh = Self::new(settings, now)?;
        if fresh.intervals().eq(self.intervals()) {
            return Ok(false);
        }
        for slot in &mut fresh.slots {
            if let Some(old) = self
                .slots
                .iter()
                .find(|o| o.task == slot.task && o.interval == slot.interval)
            {
                slot.next = old.next;
            }
        }
        *self = fresh;
        Ok(true)
    }
}

/// Runs scheduled tasks against a [`Service`] until asked to stop.
pub struct Daemon<S: Service> {
    service: S,
    schedule: Schedule,
}

impl<S: Service> Daemon<S> {
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] when an interval does not parse or
    /// none is configured.
    pub fn new(service: S) -> Result<Self> {
        let schedule = Schedule::new(&service.config().daemon, Instant::now())?;
        if schedule.is_empty() {
            return Err(Error::InvalidConfig {
                message: "no intervals configured in daemon settings".to_string(),
            });
        }
        Ok(Self { service, schedule })
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Loop until `stop` is set. Task failures are logged and never end the
    /// loop.
    pub fn run(&mut self, stop: &AtomicBool) {
        tracing::info!("Daemon started");
        for (task, interval) in self.schedule.intervals() {
            tracing::info!(%task, ?interval, "Scheduled");
        }

        while !stop.load(Ordering::SeqCst) {
            self.tick(Instant::now());

            let wait = self
                .schedule
                .next_due()
                .map(|next| next.saturating_duration_since(Instant::now()))
                .unwrap_or(POLL);
            thread::sleep(wait.min(POLL));
        }

        tracing::info!("Daemon stopped");
    }

    /// Run every task due at `now`. Returns the tasks that ran.
    pub fn tick(&mut self, now: Instant) -> Vec<Task> {
        let due = self.schedule.due(now);
        for task in &due {
            if let Err(e) = self.run_task(*task, now) {
                tracing::warn!(%task, error = %e, "Scheduled task failed");
            }
        }
        due
    }

    fn run_task(&mut self, task: Task, now: Instant) -> Result<()> {
        tracing::info!(%task, "Task started");
        match task {
            Task::Copy => {
                self.reload(now);
                let result = self.service.copy()?;
                tracing::info!(
                    paths = result.copied.len(),
                    updated = result.files_updated,
                    unchanged = result.files_skipped,
                    removed = result.files_removed,
                    "Copy done"
                );
                for path in &result.skipped {
                    tracing::info!(%path, "Skipped, not found");
                }
                if let Some(e) = &result.git_error {
                    tracing::warn!(error = %e, "Vault not committed");
                }
            }
            Task::Push => {
                self.service.push()?;
                tracing::info!("Push done");
            }
            Task::Pull => {
                let outcome = self.service.pull()?;
                tracing::info!(cloned = outcome.cloned, "Pull done");
                if self.service.config().daemon.auto_restore {
                    self.restore()?;
                }
            }
        }
        Ok(())
    }

    /// Pick up configuration edits made while running. A configuration that
    /// fails to load or parse leaves the current one in place.
    fn reload(&mut self, now: Instant) {
        if let Err(e) = self.service.reload_config() {
            tracing::warn!(error = %e, "Config reload failed, keeping current settings");
            return;
        }
        match self.schedule.reschedule(&self.service.config().daemon, now) {
            Ok(true) => {
                tracing::info!("Config reloaded, intervals updated");
                for (task, interval) in self.schedule.intervals() {
                    tracing::info!(%task, ?interval, "Scheduled");
                }
            }
            Ok(false) => {}
            Err(e) => tracing::warn!(error = %e, "Ignoring new intervals"),
        }
    }

    fn restore(&mut self) -> Result<()> {
        if self.service.reconstruct_watching()? {
            self.service.save_config(None)?;
        }
        let result = self.service.restore()?;
        tracing::info!(
            updated = result.files_updated,
            unchanged = result.files_skipped,
            "Auto restore done"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("30m", Duration::from_secs(1800))]
    #[case("6h", Duration::from_secs(6 * 3600))]
    #[case("1h30m", Duration::from_secs(5400))]
    #[case("1.5h", Duration::from_secs(5400))]
    #[case("250ms", Duration::from_millis(250))]
    #[case(" 45s ", Duration::from_secs(45))]
    #[case("0", Duration::ZERO)]
    fn test_parse_interval(#[case] input: &str, #[case] expected: Duration) {
        assert_eq!(parse_interval(input).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("30")]
    #[case("h")]
    #[case("5d")]
    #[case("-1h")]
    #[case("1h 30m")]
    #[case("99999999999999999999999h")]
    fn test_parse_interval_rejects(#[case] input: &str) {
        assert!(
            matches!(parse_interval(input), Err(Error::InvalidConfig { .. })),
            "expected '{input}' to be rejected"
        );
    }

    fn settings(copy: Option<&str>, push: Option<&str>, pull: Option<&str>) -> DaemonConfig {
        DaemonConfig {
            copy_interval: copy.map(String::from),
            push_interval: push.map(String::from),
            pull_interval: pull.map(String::from),
            auto_restore: false,
        }
    }

    #[test]
    fn test_schedule_skips_unset_and_zero_intervals() {
        let schedule = Schedule::new(&settings(Some("1m"), Some("0"), None), Instant::now()).unwrap();
        assert_eq!(
            schedule.intervals().collect::<Vec<_>>(),
            vec![(Task::Copy, Duration::from_secs(60))]
        );
        assert!(Schedule::new(&DaemonConfig::default(), Instant::now()).unwrap().is_empty());
    }

    #[test]
    fn test_schedule_names_the_bad_interval() {
        let err = Schedule::new(&settings(None, Some("soon"), None), Instant::now()).unwrap_err();
        assert!(err.to_string().contains("push_interval"), "got {err}");
    }

    #[test]
    fn test_due_fires_after_each_interval() {
        let start = Instant::now();
        let mut schedule = Schedule::new(&settings(Some("1m"), Some("2m"), None), start).unwrap();

        assert!(schedule.due(start).is_empty());
        assert_eq!(schedule.due(start + Duration::from_secs(60)), vec![Task::Copy]);
        assert_eq!(
            schedule.due(start + Duration::from_secs(120)),
            vec![Task::Copy, Task::Push]
        );
        assert_eq!(schedule.next_due(), Some(start + Duration::from_secs(180)));
    }

    #[test]
    fn test_due_drops_missed_ticks() {
        let start = Instant::now();
        let mut schedule = Schedule::new(&settings(Some("1m"), None, None), start).unwrap();

        let late = start + Duration::from_secs(600);
        assert_eq!(schedule.due(late), vec![Task::Copy]);
        assert!(schedule.due(late).is_empty());
        assert_eq!(schedule.next_due(), Some(late + Duration::from_secs(60)));
    }

    #[test]
    fn test_reschedule_keeps_unchanged_deadlines() {
        let start = Instant::now();
        let mut schedule = Schedule::new(&settings(Some("1m"), Some("1h"), None), start).unwrap();
        let later = start + Duration::from_secs(30);

        assert!(!schedule
            .reschedule(&settings(Some("1m"), Some("1h"), None), later)
            .unwrap());
        assert!(schedule
            .reschedule(&settings(Some("1m"), Some("2h"), None), later)
            .unwrap());

        assert_eq!(schedule.next_due(), Some(start + Duration::from_secs(60)));
        assert_eq!(
            schedule.intervals().collect::<Vec<_>>(),
            vec![
                (Task::Copy, Duration::from_secs(60)),
                (Task::Push, Duration::from_secs(7200)),
            ]
        );
    }
}

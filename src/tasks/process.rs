//! External Process Jobs
//!
//! Scheduled maintenance jobs (backups, map rendering, cron commands) that
//! run an external command while the server's automatic saving is suspended.

use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::io::AsyncRead;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::save_lock::SaveLock;
use super::scheduler::{TaskBody, TaskContext};
use crate::config::{Config, ConfigHandle};
use crate::error::TaskError;
use crate::host::ServerHost;

/// Sleep between checks of an in-progress world save.
const FLUSH_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Upper bound on the wait for a world save when not configured.
const DEFAULT_FLUSH_TIMEOUT_SECS: i64 = 60;

const DEFAULT_INTERVAL_MINUTES: i64 = 60;

/// How long output drains may run on after the command exits. A background
/// process that inherited the pipes can keep them open indefinitely.
const DRAIN_GRACE: Duration = Duration::from_secs(1);

// == Process Result ==
/// Exit status of a finished job command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessResult {
    pub exit_code: i32,
}

impl ProcessResult {
    /// A status without an exit code (terminated by a signal) maps to -1.
    pub fn from_status(status: ExitStatus) -> Self {
        Self {
            exit_code: status.code().unwrap_or(-1),
        }
    }

    /// Only negative exit codes count as failure.
    pub fn is_success(&self) -> bool {
        self.exit_code >= 0
    }
}

// == Process Job ==
/// A configurable external-command job.
///
/// Settings are read from the current configuration snapshot on every use,
/// under keys derived from the job's key prefix:
/// `<key>Enabled`, `<key>Announce`, `<key>Command`, `<key>IntervalMinutes`.
pub struct ProcessJob {
    key: String,
    title: String,
    config: ConfigHandle,
    host: Arc<dyn ServerHost>,
    save_lock: Arc<SaveLock>,
}

impl ProcessJob {
    /// # Arguments
    /// * `key` - Configuration key prefix, e.g. `autoBackup`
    /// * `title` - Name used in announcements, e.g. `Backup`
    pub fn new(
        key: impl Into<String>,
        title: impl Into<String>,
        config: ConfigHandle,
        host: Arc<dyn ServerHost>,
        save_lock: Arc<SaveLock>,
    ) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            config,
            host,
            save_lock,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn setting(&self, suffix: &str) -> String {
        format!("{}{}", self.key, suffix)
    }

    /// Interval between scheduled runs.
    pub fn interval(&self, config: &Config) -> chrono::Duration {
        let minutes = config
            .get_int(&self.setting("IntervalMinutes"))
            .unwrap_or(DEFAULT_INTERVAL_MINUTES)
            .max(0);
        chrono::Duration::try_minutes(minutes).unwrap_or(chrono::Duration::MAX)
    }

    fn announce(&self, config: &Config, outcome: &str) {
        if config.get_bool(&self.setting("Announce")) {
            self.host.broadcast(&format!("{} {}!", self.title, outcome));
        }
    }

    // == Cycle ==
    async fn run_cycle(&self, ctx: &TaskContext) {
        let Some(_lock) = self.save_lock.acquire(ctx.token()).await else {
            debug!(task = %self.key, "Stopped while waiting for the save lock");
            return;
        };

        let config = self.config.snapshot();
        self.announce(&config, "started");

        self.flush_world(&config, ctx).await;
        if ctx.is_stopping() {
            info!(task = %self.key, "{} skipped, stop requested before launch", self.title);
            return;
        }

        self.host.suspend_auto_flush();
        let _resume = ResumeAutoFlush(&*self.host);

        match self.execute(&config, ctx).await {
            Ok(result) if result.is_success() => {
                info!(task = %self.key, exit_code = result.exit_code, "{} complete", self.title);
                self.announce(&config, "complete");
            }
            Ok(result) => {
                warn!(
                    task = %self.key,
                    exit_code = result.exit_code,
                    "{} failed! Exited with code {}",
                    self.title,
                    result.exit_code
                );
                self.announce(&config, "failed");
            }
            Err(TaskError::Cancelled) => {
                info!(task = %self.key, "{} terminated by shutdown", self.title);
            }
            Err(e) => {
                warn!(task = %self.key, error = %e, "{} failed", self.title);
                self.announce(&config, "failed");
                self.host.error_log(&e, &format!("{} failure", self.title));
            }
        }
    }

    /// Asks the server to save and waits, bounded, until it reports done.
    /// Returns early when the task is stopped.
    async fn flush_world(&self, config: &Config, ctx: &TaskContext) {
        let timeout_secs = config
            .get_int("flushTimeoutSeconds")
            .unwrap_or(DEFAULT_FLUSH_TIMEOUT_SECS)
            .max(0) as u64;
        let timeout = Duration::from_secs(timeout_secs);

        self.host.trigger_full_flush();

        let started = Instant::now();
        while self.host.is_flush_in_progress() {
            if started.elapsed() >= timeout {
                warn!(task = %self.key, timeout_secs, "World save still running, continuing anyway");
                break;
            }
            tokio::select! {
                _ = tokio::time::sleep(FLUSH_POLL_INTERVAL) => {}
                _ = ctx.cancelled() => return,
            }
        }
    }

    /// Launches the command, drains its output and waits for it to exit.
    /// A stop observed while waiting kills the child.
    async fn execute(&self, config: &Config, ctx: &TaskContext) -> Result<ProcessResult, TaskError> {
        let command_line = config
            .get(&self.setting("Command"))
            .unwrap_or_default()
            .to_string();

        let mut parts = command_line.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| TaskError::NoCommand(self.key.clone()))?;

        let mut child = Command::new(program)
            .args(parts)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| TaskError::Launch {
                command: command_line.clone(),
                source,
            })?;

        info!(task = %self.key, pid = child.id(), command = %command_line, "Launched job command");

        // Unread pipes would fill up and block the child forever.
        let drains = [
            child.stdout.take().map(|out| tokio::spawn(drain(out))),
            child.stderr.take().map(|err| tokio::spawn(drain(err))),
        ];

        let waited = tokio::select! {
            status = child.wait() => Some(status),
            _ = ctx.cancelled() => None,
        };

        let status = match waited {
            Some(status) => status.map_err(|source| TaskError::Wait {
                command: command_line.clone(),
                source,
            })?,
            None => {
                warn!(task = %self.key, "Stop requested, killing job command");
                if let Err(e) = child.kill().await {
                    warn!(task = %self.key, error = %e, "Failed to kill job command");
                }
                return Err(TaskError::Cancelled);
            }
        };

        let deadline = tokio::time::Instant::now() + DRAIN_GRACE;
        for mut handle in drains.into_iter().flatten() {
            match tokio::time::timeout_at(deadline, &mut handle).await {
                Ok(Ok(bytes)) => debug!(task = %self.key, bytes, "Discarded job output"),
                Ok(Err(_)) => {}
                Err(_) => {
                    debug!(task = %self.key, "Job output still open after exit, detaching");
                    handle.abort();
                }
            }
        }

        Ok(ProcessResult::from_status(status))
    }
}

impl TaskBody for ProcessJob {
    fn is_enabled(&self) -> bool {
        self.config.snapshot().get_bool(&self.setting("Enabled"))
    }

    fn next_run(&self, last_run: DateTime<Utc>) -> DateTime<Utc> {
        let interval = self.interval(&self.config.snapshot());
        last_run
            .checked_add_signed(interval)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    async fn run(&self, ctx: &TaskContext) {
        self.run_cycle(ctx).await;
    }
}

/// Turns automatic saving back on when dropped.
struct ResumeAutoFlush<'a>(&'a dyn ServerHost);

impl Drop for ResumeAutoFlush<'_> {
    fn drop(&mut self) {
        self.0.resume_auto_flush();
    }
}

/// Reads a child stream to the end, discarding the bytes.
async fn drain<R: AsyncRead + Unpin>(mut stream: R) -> u64 {
    tokio::io::copy(&mut stream, &mut tokio::io::sink())
        .await
        .unwrap_or(0)
}

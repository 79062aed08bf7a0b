//! Scheduled Task Driver
//!
//! Generic recurring-task engine. Each [`ScheduledTask`] owns one background
//! tokio task that polls its body's schedule and runs it when due.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::{debug, error, info};

// == Task Body ==
/// The work a scheduled task performs and the rules deciding when.
pub trait TaskBody: Send + Sync + 'static {
    /// Whether scheduled (non-forced) runs are allowed at all.
    fn is_enabled(&self) -> bool;

    /// Earliest time the next scheduled run may start.
    fn next_run(&self, last_run: DateTime<Utc>) -> DateTime<Utc>;

    /// One execution. Long waits inside should also complete on
    /// [`TaskContext::cancelled`] so that stopping the task is prompt.
    fn run(&self, ctx: &TaskContext) -> impl Future<Output = ()> + Send;
}

// == Task Context ==
/// Per-task handle passed to [`TaskBody::run`].
#[derive(Debug, Clone)]
pub struct TaskContext {
    name: Arc<str>,
    cancel: CancellationToken,
}

impl TaskContext {
    pub fn new(name: &str, cancel: CancellationToken) -> Self {
        Self {
            name: Arc::from(name),
            cancel,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True once the task has been asked to stop.
    pub fn is_stopping(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Completes when the task is stopped.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }
}

// == Task Status ==
/// Point-in-time view of a task, as reported by the admin API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskStatus {
    pub name: String,
    pub enabled: bool,
    pub paused: bool,
    pub running: bool,
    pub force_requested: bool,
    /// Completion time of the most recent execution, if any
    pub last_run: Option<DateTime<Utc>>,
}

// == Task Control ==
/// Object-safe control surface shared by every scheduled task.
pub trait TaskControl: Send + Sync {
    fn name(&self) -> &str;
    fn force_run(&self);
    fn set_paused(&self, paused: bool);
    fn stop(&self);
    fn status(&self) -> TaskStatus;

    /// Hands out the driver's join handle once, for awaiting shutdown.
    fn take_handle(&self) -> Option<JoinHandle<()>>;
}

// == Shared State ==
struct TaskState {
    name: Arc<str>,
    poll_interval: Duration,
    /// Scheduling baseline in Unix milliseconds
    last_run_ms: AtomicI64,
    has_run: AtomicBool,
    paused: AtomicBool,
    force_requested: AtomicBool,
    cancel: CancellationToken,
}

impl TaskState {
    fn last_run(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.last_run_ms.load(Ordering::SeqCst)).unwrap_or_default()
    }

    fn record_run(&self, at: DateTime<Utc>) {
        self.last_run_ms.store(at.timestamp_millis(), Ordering::SeqCst);
        self.has_run.store(true, Ordering::SeqCst);
    }

    fn needs_run<B: TaskBody>(&self, body: &B, now: DateTime<Utc>) -> bool {
        body.is_enabled() && body.next_run(self.last_run()) <= now
    }
}

// == Scheduled Task ==
/// A recurring task with its own driver.
///
/// The driver loop checks, once per poll interval, whether the task is
/// forced or due, runs the body if so, then sleeps. Executions of one task
/// never overlap since the driver is their only caller.
pub struct ScheduledTask<B: TaskBody> {
    state: Arc<TaskState>,
    body: Arc<B>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl<B: TaskBody> ScheduledTask<B> {
    /// Creates the task and starts its driver on the current tokio runtime.
    ///
    /// # Arguments
    /// * `name` - Task name used in logs and by the admin API
    /// * `poll_interval` - Sleep between schedule checks
    /// * `initial_run` - If true the schedule counts from the Unix epoch, so
    ///   an enabled task runs on the first poll; otherwise it counts from now
    /// * `body` - The work and its schedule
    pub fn spawn(
        name: impl Into<String>,
        poll_interval: Duration,
        initial_run: bool,
        body: B,
    ) -> Self {
        let name: Arc<str> = Arc::from(name.into());
        let baseline = if initial_run {
            DateTime::<Utc>::UNIX_EPOCH
        } else {
            Utc::now()
        };

        let state = Arc::new(TaskState {
            name,
            poll_interval,
            last_run_ms: AtomicI64::new(baseline.timestamp_millis()),
            has_run: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            force_requested: AtomicBool::new(false),
            cancel: CancellationToken::new(),
        });
        let body = Arc::new(body);

        let handle = tokio::spawn(drive(Arc::clone(&state), Arc::clone(&body)));

        Self {
            state,
            body,
            handle: Mutex::new(Some(handle)),
        }
    }

    pub fn name(&self) -> &str {
        &self.state.name
    }

    pub fn body(&self) -> &B {
        &self.body
    }

    /// Requests one execution on the next poll, ignoring the schedule.
    pub fn force_run(&self) {
        self.state.force_requested.store(true, Ordering::SeqCst);
    }

    pub fn is_force_requested(&self) -> bool {
        self.state.force_requested.load(Ordering::SeqCst)
    }

    /// While paused the driver keeps polling but never executes.
    pub fn set_paused(&self, paused: bool) {
        self.state.paused.store(paused, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.state.paused.load(Ordering::SeqCst)
    }

    /// False once [`ScheduledTask::stop`] has been called.
    pub fn is_running(&self) -> bool {
        !self.state.cancel.is_cancelled()
    }

    /// Stops the driver and wakes it from its sleep. A body that is already
    /// executing is not aborted; it observes the stop through its context.
    pub fn stop(&self) {
        if !self.state.cancel.is_cancelled() {
            debug!(task = %self.state.name, "Stop requested");
        }
        self.state.cancel.cancel();
    }

    /// Scheduling baseline: last completion time, or the time chosen at
    /// construction if the task has not run yet.
    pub fn last_run(&self) -> DateTime<Utc> {
        self.state.last_run()
    }

    /// True iff enabled and the next scheduled time has passed.
    /// Forced runs are not considered.
    pub fn needs_run(&self) -> bool {
        self.needs_run_at(Utc::now())
    }

    pub fn needs_run_at(&self, now: DateTime<Utc>) -> bool {
        self.state.needs_run(&*self.body, now)
    }

    pub fn status(&self) -> TaskStatus {
        TaskStatus {
            name: self.state.name.to_string(),
            enabled: self.body.is_enabled(),
            paused: self.is_paused(),
            running: self.is_running(),
            force_requested: self.is_force_requested(),
            last_run: self
                .state
                .has_run
                .load(Ordering::SeqCst)
                .then(|| self.state.last_run()),
        }
    }

    /// Waits for the driver to exit. Call after [`ScheduledTask::stop`].
    pub async fn join(&self) {
        let handle = self.take_handle();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(task = %self.state.name, error = %e, "Task driver panicked");
            }
        }
    }

    fn take_handle(&self) -> Option<JoinHandle<()>> {
        match self.handle.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }
}

impl<B: TaskBody> TaskControl for ScheduledTask<B> {
    fn name(&self) -> &str {
        ScheduledTask::name(self)
    }

    fn force_run(&self) {
        ScheduledTask::force_run(self)
    }

    fn set_paused(&self, paused: bool) {
        ScheduledTask::set_paused(self, paused)
    }

    fn stop(&self) {
        ScheduledTask::stop(self)
    }

    fn status(&self) -> TaskStatus {
        ScheduledTask::status(self)
    }

    fn take_handle(&self) -> Option<JoinHandle<()>> {
        ScheduledTask::take_handle(self)
    }
}

// == Driver Loop ==
async fn drive<B: TaskBody>(state: Arc<TaskState>, body: Arc<B>) {
    let ctx = TaskContext {
        name: Arc::clone(&state.name),
        cancel: state.cancel.clone(),
    };

    info!(
        task = %state.name,
        poll_ms = state.poll_interval.as_millis() as u64,
        "Task driver started"
    );

    while !state.cancel.is_cancelled() {
        let due = state.force_requested.load(Ordering::SeqCst) || state.needs_run(&*body, Utc::now());

        if due && !state.paused.load(Ordering::SeqCst) {
            let forced = state.force_requested.swap(false, Ordering::SeqCst);
            debug!(task = %state.name, forced, "Running task");

            body.run(&ctx).await;

            state.record_run(Utc::now());
        }

        tokio::select! {
            _ = tokio::time::sleep(state.poll_interval) => {}
            _ = state.cancel.cancelled() => {}
        }
    }

    info!(task = %state.name, "Task driver stopped");
}

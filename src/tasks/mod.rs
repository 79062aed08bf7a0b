//! Background Tasks Module
//!
//! Scheduled maintenance jobs that run while the admin layer is up.
//!
//! # Tasks
//! - `autoBackup`, `autoMap`, `autoRun`: external commands run under the save lock
//! - `playerTracker`: mirrors tracked players into the database

mod process;
mod save_lock;
mod scheduler;
mod tracker;


use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use crate::config::ConfigHandle;
use crate::database::ConnectionRegistry;
use crate::host::ServerHost;

pub use process::{ProcessJob, ProcessResult};
pub use save_lock::{SaveLock, SaveLockGuard};
pub use scheduler::{ScheduledTask, TaskBody, TaskContext, TaskControl, TaskStatus};
pub use tracker::PlayerTracker;

/// Sleep between schedule checks for every built-in task.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Name of the player tracker task.
pub const TRACKER_TASK: &str = "playerTracker";

/// Configuration key prefix and announcement title of each process job.
pub const PROCESS_JOBS: [(&str, &str); 3] = [
    ("autoBackup", "Backup"),
    ("autoMap", "Mapping"),
    ("autoRun", "Cron"),
];

// == Task Set ==
/// The running tasks, addressable by name.
#[derive(Clone, Default)]
pub struct TaskSet {
    tasks: Vec<Arc<dyn TaskControl>>,
}

impl TaskSet {
    /// Wraps already running tasks.
    pub fn new(tasks: Vec<Arc<dyn TaskControl>>) -> Self {
        Self { tasks }
    }

    /// Starts the built-in tasks on the current tokio runtime.
    ///
    /// The process jobs share one [`SaveLock`] and first run one interval
    /// after startup; the tracker runs on its first poll.
    ///
    /// # Arguments
    /// * `config` - Live configuration read by every task on each poll
    /// * `host` - The game server the jobs act on
    /// * `registry` - Source of database connections for the tracker
    pub fn spawn(
        config: ConfigHandle,
        host: Arc<dyn ServerHost>,
        registry: Arc<ConnectionRegistry>,
        poll_interval: Duration,
    ) -> Self {
        let save_lock = Arc::new(SaveLock::new());
        let mut tasks: Vec<Arc<dyn TaskControl>> = Vec::with_capacity(PROCESS_JOBS.len() + 1);

        for (key, title) in PROCESS_JOBS {
            let job = ProcessJob::new(
                key,
                title,
                config.clone(),
                Arc::clone(&host),
                Arc::clone(&save_lock),
            );
            tasks.push(Arc::new(ScheduledTask::spawn(key, poll_interval, false, job)));
        }

        let tracker = PlayerTracker::new(config, host, registry);
        tasks.push(Arc::new(ScheduledTask::spawn(
            TRACKER_TASK,
            poll_interval,
            true,
            tracker,
        )));

        info!(count = tasks.len(), "Background tasks started");
        Self { tasks }
    }

    pub fn find(&self, name: &str) -> Option<&Arc<dyn TaskControl>> {
        self.tasks.iter().find(|task| task.name() == name)
    }

    pub fn statuses(&self) -> Vec<TaskStatus> {
        self.tasks.iter().map(|task| task.status()).collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Stops every task and waits for all drivers to exit.
    pub async fn shutdown(&self) {
        for task in &self.tasks {
            task.stop();
        }

        for task in &self.tasks {
            if let Some(handle) = task.take_handle() {
                if let Err(e) = handle.await {
                    error!(task = %task.name(), error = %e, "Task driver panicked");
                }
            }
        }

        info!("Background tasks stopped");
    }
}

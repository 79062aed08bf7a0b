//! Console Host
//!
//! [`ServerHost`] implementation that drives the wrapped game server through
//! its console: every request becomes one command line on the output stream.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, error, warn};

use super::{EntityDirectory, ServerHost, TrackedEntity};

/// Writes console commands for the game server and tracks save progress.
///
/// A flush stays "in progress" from `save-all` until the wrapper reports
/// completion through [`ConsoleHost::mark_flush_complete`].
pub struct ConsoleHost {
    out: Mutex<Box<dyn Write + Send>>,
    flushing: AtomicBool,
    entities: Arc<EntityDirectory>,
}

impl ConsoleHost {
    /// Console host writing to this process's stdout.
    pub fn new(entities: Arc<EntityDirectory>) -> Self {
        Self::with_writer(io::stdout(), entities)
    }

    pub fn with_writer(writer: impl Write + Send + 'static, entities: Arc<EntityDirectory>) -> Self {
        Self {
            out: Mutex::new(Box::new(writer)),
            flushing: AtomicBool::new(false),
            entities,
        }
    }

    /// Called once the server reports that its save finished.
    pub fn mark_flush_complete(&self) {
        if self.flushing.swap(false, Ordering::SeqCst) {
            debug!("World save reported complete");
        }
    }

    fn send(&self, command: &str) {
        let mut out = match self.out.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Err(e) = writeln!(out, "{}", command).and_then(|_| out.flush()) {
            warn!(error = %e, command, "Failed to write console command");
        }
    }
}

impl ServerHost for ConsoleHost {
    fn broadcast(&self, message: &str) {
        self.send(&format!("say {}", message));
    }

    fn trigger_full_flush(&self) {
        self.flushing.store(true, Ordering::SeqCst);
        self.send("save-all");
    }

    fn is_flush_in_progress(&self) -> bool {
        self.flushing.load(Ordering::SeqCst)
    }

    fn suspend_auto_flush(&self) {
        self.send("save-off");
    }

    fn resume_auto_flush(&self) {
        self.send("save-on");
    }

    fn error_log(&self, err: &(dyn std::error::Error + 'static), context: &str) {
        error!(error = %err, "{}", context);
    }

    fn tracked_entities(&self) -> Vec<TrackedEntity> {
        self.entities.snapshot()
    }
}

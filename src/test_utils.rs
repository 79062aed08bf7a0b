//! Shared test doubles.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::host::{ServerHost, TrackedEntity};

/// Host call as seen by [`RecordingHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Broadcast(String),
    Flush,
    SuspendAutoFlush,
    ResumeAutoFlush,
}

/// In-memory [`ServerHost`] that records every call.
#[derive(Default)]
pub struct RecordingHost {
    events: Mutex<Vec<HostEvent>>,
    errors: Mutex<Vec<String>>,
    entities: Mutex<Vec<TrackedEntity>>,
    endless_flush: AtomicBool,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host whose world save never reports completion.
    pub fn with_endless_flush() -> Self {
        let host = Self::default();
        host.endless_flush.store(true, Ordering::SeqCst);
        host
    }

    pub fn set_entities(&self, entities: Vec<TrackedEntity>) {
        *self.entities.lock().unwrap() = entities;
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn broadcasts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                HostEvent::Broadcast(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    /// Contexts passed to `error_log`, in order.
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    fn record(&self, event: HostEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl ServerHost for RecordingHost {
    fn broadcast(&self, message: &str) {
        self.record(HostEvent::Broadcast(message.to_string()));
    }

    fn trigger_full_flush(&self) {
        self.record(HostEvent::Flush);
    }

    fn is_flush_in_progress(&self) -> bool {
        self.endless_flush.load(Ordering::SeqCst)
    }

    fn suspend_auto_flush(&self) {
        self.record(HostEvent::SuspendAutoFlush);
    }

    fn resume_auto_flush(&self) {
        self.record(HostEvent::ResumeAutoFlush);
    }

    fn error_log(&self, _error: &(dyn std::error::Error + 'static), context: &str) {
        self.errors.lock().unwrap().push(context.to_string());
    }

    fn tracked_entities(&self) -> Vec<TrackedEntity> {
        self.entities.lock().unwrap().clone()
    }
}

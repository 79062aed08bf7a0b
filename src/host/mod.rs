//! Host Module
//!
//! The surrounding game server as seen by the background tasks: announcements,
//! save coordination, error reporting and the set of tracked players.

mod console;
mod entities;

pub use console::ConsoleHost;
pub use entities::{Dimension, EntityDirectory, Position, TrackedEntity};

/// Collaborator interface the background tasks drive.
///
/// Implementations must be cheap to call; they are invoked from task bodies
/// between suspension points.
pub trait ServerHost: Send + Sync + 'static {
    /// Sends a user-visible announcement to everyone on the server.
    fn broadcast(&self, message: &str);

    /// Asks the server to write all world state to disk.
    fn trigger_full_flush(&self);

    /// True while a flush started by [`ServerHost::trigger_full_flush`] runs.
    fn is_flush_in_progress(&self) -> bool;

    /// Turns off the server's own periodic saving.
    fn suspend_auto_flush(&self);

    /// Turns periodic saving back on.
    fn resume_auto_flush(&self);

    /// Records a failure together with a short description of what failed.
    fn error_log(&self, error: &(dyn std::error::Error + 'static), context: &str);

    /// Snapshot of the currently tracked players.
    fn tracked_entities(&self) -> Vec<TrackedEntity>;
}

//! Player Tracker
//!
//! Mirrors the host's tracked entities into the database snapshot table on
//! a fixed interval.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::scheduler::{TaskBody, TaskContext};
use crate::config::ConfigHandle;
use crate::database::{ConnectionRegistry, SnapshotRow};
use crate::error::ConnectionError;
use crate::host::ServerHost;

const DEFAULT_INTERVAL_SECONDS: i64 = 10;

/// Scheduled job replacing the snapshot table with the current entity set.
pub struct PlayerTracker {
    config: ConfigHandle,
    host: Arc<dyn ServerHost>,
    registry: Arc<ConnectionRegistry>,
}

impl PlayerTracker {
    pub fn new(
        config: ConfigHandle,
        host: Arc<dyn ServerHost>,
        registry: Arc<ConnectionRegistry>,
    ) -> Self {
        Self {
            config,
            host,
            registry,
        }
    }

    /// One sync cycle. Errors end the cycle and are reported to the host.
    pub async fn sync(&self) {
        let rows: Vec<SnapshotRow> = self
            .host
            .tracked_entities()
            .iter()
            .map(SnapshotRow::from)
            .collect();

        let connection = match self.registry.connect().await {
            Ok(connection) => connection,
            Err(e) => {
                self.report(&e);
                return;
            }
        };

        match connection.replace_snapshot(&rows).await {
            Ok(written) => debug!(rows = written, "Player snapshot updated"),
            Err(e) => self.report(&e),
        }

        if let Err(e) = connection.close().await {
            warn!(error = %e, "Failed to properly close database connection");
            self.host
                .error_log(&e, "Failed to properly close database connection");
        }
    }

    fn report(&self, error: &ConnectionError) {
        let context = match error {
            ConnectionError::MissingDriver(_) => "Failed to load database driver",
            ConnectionError::Configuration(_) => "Database configuration invalid or missing",
            _ => "Database update failed",
        };
        warn!(error = %error, "{}", context);
        self.host.error_log(error, context);
    }
}

impl TaskBody for PlayerTracker {
    fn is_enabled(&self) -> bool {
        self.config.snapshot().get_bool("playerTrackerEnabled")
    }

    fn next_run(&self, last_run: DateTime<Utc>) -> DateTime<Utc> {
        let seconds = self
            .config
            .snapshot()
            .get_int("playerTrackerIntervalSeconds")
            .unwrap_or(DEFAULT_INTERVAL_SECONDS)
            .max(0);
        chrono::Duration::try_seconds(seconds)
            .and_then(|interval| last_run.checked_add_signed(interval))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    async fn run(&self, _ctx: &TaskContext) {
        self.sync().await;
    }
}

//! Connection Registry
//!
//! Owns the shared database connection: selects the configured backend,
//! opens it on first use, and reopens it when it stops answering.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{info, warn};

use super::backend::Backend;
use super::connection::{ManagedConnection, DEFAULT_VALIDITY_TIMEOUT};
use crate::config::{Config, ConfigHandle};
use crate::error::ConnectionError;

/// Lazily opened, self-healing database connection.
pub struct ConnectionRegistry {
    config: ConfigHandle,
    current: Mutex<Option<Arc<ManagedConnection>>>,
    validity_timeout: Duration,
}

impl ConnectionRegistry {
    pub fn new(config: ConfigHandle) -> Self {
        Self {
            config,
            current: Mutex::new(None),
            validity_timeout: DEFAULT_VALIDITY_TIMEOUT,
        }
    }

    /// Overrides the time allowed for the validity probe before reuse.
    pub fn with_validity_timeout(mut self, timeout: Duration) -> Self {
        self.validity_timeout = timeout;
        self
    }

    /// The `dbEnabled` flag.
    pub fn is_enabled(&self) -> bool {
        self.config.snapshot().get_bool("dbEnabled")
    }

    /// Picks the backend named by `dbConnector`.
    pub fn select_backend(config: &Config) -> Result<Backend, ConnectionError> {
        let name = config.get("dbConnector").ok_or_else(|| {
            ConnectionError::Configuration("Missing dbConnector from configuration".to_string())
        })?;

        Backend::from_name(name).ok_or_else(|| {
            ConnectionError::Configuration(format!(
                "Specified database connector {} was not found",
                name
            ))
        })
    }

    // == Shared Connection ==
    /// Returns the shared connection, opening or reopening it as needed.
    ///
    /// When database access is disabled any existing connection is closed
    /// and `Disabled` is returned. A connection that passes its validity
    /// probe is reused as is.
    pub async fn open(&self) -> Result<Arc<ManagedConnection>, ConnectionError> {
        let config = self.config.snapshot();
        let mut current = self.current.lock().await;

        if !config.get_bool("dbEnabled") {
            if let Some(connection) = current.take() {
                close_logged(&connection, "disabled").await;
            }
            return Err(ConnectionError::Disabled);
        }

        if let Some(connection) = current.as_ref() {
            if connection.is_valid(self.validity_timeout).await {
                return Ok(Arc::clone(connection));
            }
        }

        if let Some(stale) = current.take() {
            info!(backend = %stale.backend(), "Reopening invalid database connection");
            close_logged(&stale, "stale").await;
        }

        let backend = Self::select_backend(&config)?;
        let connection = Arc::new(ManagedConnection::new(backend));
        connection.open(&config).await?;

        *current = Some(Arc::clone(&connection));
        Ok(connection)
    }

    /// Closes the shared connection, if any.
    pub async fn close(&self) -> Result<(), ConnectionError> {
        let connection = self.current.lock().await.take();
        match connection {
            Some(connection) => connection.close().await,
            None => Ok(()),
        }
    }

    /// The shared connection if one is currently held.
    pub async fn current(&self) -> Option<Arc<ManagedConnection>> {
        self.current.lock().await.clone()
    }

    // == One-shot Connections ==
    /// Opens a new connection owned by the caller, who must close it.
    ///
    /// Used by jobs that connect once per cycle. The shared connection is
    /// left untouched.
    pub async fn connect(&self) -> Result<ManagedConnection, ConnectionError> {
        let config = self.config.snapshot();
        let backend = Self::select_backend(&config)?;

        let connection = ManagedConnection::new(backend);
        connection.open(&config).await?;
        Ok(connection)
    }
}

async fn close_logged(connection: &ManagedConnection, reason: &str) {
    if let Err(e) = connection.close().await {
        warn!(backend = %connection.backend(), reason, error = %e, "Failed to close database connection");
    }
}

//! Managed Connection
//!
//! One physical database handle with explicit open/validate/close lifecycle.

use std::time::Duration;

use sqlx::any::{install_default_drivers, AnyRow};
use sqlx::{AnyConnection, Connection};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::backend::Backend;
use super::snapshot::{self, SnapshotRow};
use crate::config::Config;
use crate::error::ConnectionError;

/// Default time allowed for a liveness probe.
pub const DEFAULT_VALIDITY_TIMEOUT: Duration = Duration::from_secs(10);

// == Managed Connection ==
/// A database connection for one backend that may or may not be open.
///
/// The handle sits behind an async mutex, so statements issued through the
/// same `ManagedConnection` run one at a time.
pub struct ManagedConnection {
    backend: Backend,
    handle: Mutex<Option<AnyConnection>>,
}

impl ManagedConnection {
    /// Creates a closed connection for `backend`.
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            handle: Mutex::new(None),
        }
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    // == Open ==
    /// Connects using the backend's settings from `config`.
    ///
    /// Fails with `MissingDriver` if the backend is not compiled in,
    /// `Configuration` if its settings are incomplete, and `Connection` for
    /// anything the driver reports. An already-open handle is replaced.
    pub async fn open(&self, config: &Config) -> Result<(), ConnectionError> {
        if !self.backend.is_available() {
            return Err(ConnectionError::MissingDriver(self.backend.name().to_string()));
        }

        let url = self.backend.connect_url(config)?;

        install_default_drivers();
        let connection = AnyConnection::connect(&url).await?;

        let stale = self.handle.lock().await.replace(connection);
        if let Some(stale) = stale {
            if let Err(e) = stale.close().await {
                warn!(backend = %self.backend, error = %e, "Failed to close replaced connection");
            }
        }

        info!(backend = %self.backend, "Database connection opened");
        Ok(())
    }

    pub async fn is_open(&self) -> bool {
        self.handle.lock().await.is_some()
    }

    // == Validity ==
    /// Pings the server. False when closed, on error, or past `timeout`.
    pub async fn is_valid(&self, timeout: Duration) -> bool {
        let mut handle = self.handle.lock().await;
        let Some(connection) = handle.as_mut() else {
            return false;
        };

        match tokio::time::timeout(timeout, connection.ping()).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                debug!(backend = %self.backend, error = %e, "Connection failed validity probe");
                false
            }
            Err(_) => {
                debug!(backend = %self.backend, "Connection validity probe timed out");
                false
            }
        }
    }

    // == Close ==
    /// Releases the handle. The connection is closed afterwards even when the
    /// driver reports an error, which is returned after cleanup.
    pub async fn close(&self) -> Result<(), ConnectionError> {
        let connection = self.handle.lock().await.take();

        match connection {
            Some(connection) => {
                connection.close().await?;
                info!(backend = %self.backend, "Database connection closed");
                Ok(())
            }
            None => Ok(()),
        }
    }

    // == Statements ==
    /// Runs a statement, returning the number of affected rows.
    pub async fn execute(&self, sql: &str) -> Result<u64, ConnectionError> {
        let mut handle = self.handle.lock().await;
        let connection = handle.as_mut().ok_or(ConnectionError::NotOpen)?;

        let result = sqlx::query(sql).execute(&mut *connection).await?;
        Ok(result.rows_affected())
    }

    /// Runs a query and collects every row.
    pub async fn query(&self, sql: &str) -> Result<Vec<AnyRow>, ConnectionError> {
        let mut handle = self.handle.lock().await;
        let connection = handle.as_mut().ok_or(ConnectionError::NotOpen)?;

        Ok(sqlx::query(sql).fetch_all(&mut *connection).await?)
    }

    /// Atomically replaces the player snapshot table with `rows`.
    pub async fn replace_snapshot(&self, rows: &[SnapshotRow]) -> Result<u64, ConnectionError> {
        let mut handle = self.handle.lock().await;
        let connection = handle.as_mut().ok_or(ConnectionError::NotOpen)?;

        Ok(snapshot::replace_rows(connection, rows).await?)
    }
}

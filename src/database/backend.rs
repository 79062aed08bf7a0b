//! Database Backends
//!
//! The set of supported database backends and how each builds its
//! connection URL from configuration.

use std::fmt;

use crate::config::Config;
use crate::error::ConnectionError;

/// A database implementation selectable through `dbConnector`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    MySql,
    Sqlite,
}

impl Backend {
    pub const ALL: [Backend; 2] = [Backend::MySql, Backend::Sqlite];

    /// Looks a backend up by its configuration name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|backend| backend.name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn name(self) -> &'static str {
        match self {
            Backend::MySql => "mysql",
            Backend::Sqlite => "sqlite",
        }
    }

    /// Whether this build includes the backend's driver.
    pub fn is_available(self) -> bool {
        match self {
            Backend::MySql => cfg!(feature = "mysql"),
            Backend::Sqlite => cfg!(feature = "sqlite"),
        }
    }

    /// Builds the connection URL from the backend's configuration keys.
    ///
    /// # MySQL
    /// - `dbMySQLHostname` (default `localhost`)
    /// - `dbMySQLDatabase` (required)
    /// - `dbMySQLUsername`, `dbMySQLPassword` (optional; a password needs a username)
    ///
    /// # SQLite
    /// - `dbSQLitePath` (required; created if missing)
    pub fn connect_url(self, config: &Config) -> Result<String, ConnectionError> {
        match self {
            Backend::MySql => {
                let host = config.get("dbMySQLHostname").unwrap_or("localhost");
                let database = config.get("dbMySQLDatabase").ok_or_else(|| {
                    ConnectionError::Configuration("Missing MySQL database name".to_string())
                })?;

                let credentials = match (config.get("dbMySQLUsername"), config.get("dbMySQLPassword")) {
                    (None, None) => String::new(),
                    (Some(user), None) => format!("{}@", percent_encode(user, b"")),
                    (Some(user), Some(password)) => format!(
                        "{}:{}@",
                        percent_encode(user, b""),
                        percent_encode(password, b"")
                    ),
                    (None, Some(_)) => {
                        return Err(ConnectionError::Configuration(
                            "MySQL password given without a username".to_string(),
                        ))
                    }
                };

                Ok(format!(
                    "mysql://{}{}/{}",
                    credentials,
                    host,
                    percent_encode(database, b"")
                ))
            }
            Backend::Sqlite => {
                let path = config.get("dbSQLitePath").ok_or_else(|| {
                    ConnectionError::Configuration("Missing SQLite database path".to_string())
                })?;
                Ok(format!("sqlite://{}?mode=rwc", percent_encode(path, b"/")))
            }
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Percent-encodes everything outside the URL "unreserved" set and `keep`.
fn percent_encode(value: &str, keep: &[u8]) -> String {
    value
        .bytes()
        .map(|b| {
            if b.is_ascii_alphanumeric() || b"-._~".contains(&b) || keep.contains(&b) {
                (b as char).to_string()
            } else {
                format!("%{:02X}", b)
            }
        })
        .collect()
}

//! Configuration Module
//!
//! Key/value configuration snapshot consumed by the background tasks and the
//! database registry through typed accessors.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use std::sync::{Arc, RwLock};

use crate::error::ConfigError;

/// Prefix marking environment variables that override configuration keys.
pub const ENV_PREFIX: &str = "WARDEN_";

/// Environment variable naming an optional `key=value` properties file.
pub const CONFIG_PATH_VAR: &str = "WARDEN_CONFIG";

/// Built-in defaults for every key the crate reads.
const DEFAULTS: &[(&str, &str)] = &[
    ("adminPort", "8765"),
    ("flushTimeoutSeconds", "60"),
    ("autoBackupEnabled", "false"),
    ("autoBackupAnnounce", "true"),
    ("autoBackupCommand", ""),
    ("autoBackupIntervalMinutes", "60"),
    ("autoMapEnabled", "false"),
    ("autoMapAnnounce", "true"),
    ("autoMapCommand", ""),
    ("autoMapIntervalMinutes", "60"),
    ("autoRunEnabled", "false"),
    ("autoRunAnnounce", "false"),
    ("autoRunCommand", ""),
    ("autoRunIntervalMinutes", "60"),
    ("playerTrackerEnabled", "false"),
    ("playerTrackerIntervalSeconds", "10"),
    ("dbEnabled", "false"),
    ("dbConnector", "mysql"),
    ("dbMySQLHostname", "localhost"),
];

/// Immutable configuration snapshot.
///
/// Values are stored as strings and interpreted by the accessor used to read
/// them. A snapshot is never mutated after construction; reloading swaps in
/// a new one through [`ConfigHandle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    values: HashMap<String, String>,
}

impl Config {
    // == Constructors ==
    /// Creates a snapshot holding exactly the given pairs, without defaults.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parses `key=value` lines. Blank lines and lines starting with `#` are
    /// skipped; whitespace around keys and values is trimmed.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();

        for (index, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (key, value) = line.split_once('=').ok_or_else(|| ConfigError::Parse {
                line: index + 1,
                message: format!("expected key=value, got '{}'", line),
            })?;

            let key = key.trim();
            if key.is_empty() {
                return Err(ConfigError::Parse {
                    line: index + 1,
                    message: "empty key".to_string(),
                });
            }

            values.insert(key.to_string(), value.trim().to_string());
        }

        Ok(Self { values })
    }

    /// Loads the full configuration: defaults, then the properties file named
    /// by `WARDEN_CONFIG` (if set), then `WARDEN_<key>` environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(path) = env::var(CONFIG_PATH_VAR) {
            config = config.merged(Self::from_file(path)?);
        }

        Ok(config.merged(Self::from_env()))
    }

    /// Reads a properties file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Collects `WARDEN_<key>` environment variables, keeping the key's case.
    pub fn from_env() -> Self {
        Self::from_pairs(env::vars().filter_map(|(name, value)| {
            name.strip_prefix(ENV_PREFIX)
                .filter(|key| !key.is_empty() && *key != "CONFIG")
                .map(|key| (key.to_string(), value))
        }))
    }

    /// Returns a new snapshot where `other`'s keys override this one's.
    pub fn merged(mut self, other: Config) -> Self {
        self.values.extend(other.values);
        self
    }

    /// Returns a copy with one key set. Intended for building snapshots.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    // == Typed Accessors ==
    /// Raw string value. Empty values count as unset.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Boolean flag. Missing or unparseable values read as `false`.
    pub fn get_bool(&self, key: &str) -> bool {
        matches!(
            self.get(key).map(str::to_ascii_lowercase).as_deref(),
            Some("true" | "yes" | "on" | "1")
        )
    }

    /// Integer value, `None` when missing or unparseable.
    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|value| value.parse().ok())
    }

    /// Admin API port.
    pub fn admin_port(&self) -> u16 {
        self.get_int("adminPort")
            .and_then(|port| u16::try_from(port).ok())
            .unwrap_or(8765)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_pairs(DEFAULTS.iter().copied())
    }
}

// == Config Handle ==
/// Shared handle to the current configuration snapshot.
///
/// Readers take a cheap `Arc` clone of the snapshot and keep a consistent
/// view for as long as they hold it; [`ConfigHandle::reload`] replaces the
/// snapshot as a whole.
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    current: Arc<RwLock<Arc<Config>>>,
}

impl ConfigHandle {
    pub fn new(config: Config) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(config))),
        }
    }

    /// Returns the current snapshot.
    pub fn snapshot(&self) -> Arc<Config> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&*guard),
            Err(poisoned) => Arc::clone(&*poisoned.into_inner()),
        }
    }

    /// Atomically replaces the current snapshot.
    pub fn reload(&self, config: Config) {
        let config = Arc::new(config);
        match self.current.write() {
            Ok(mut guard) => *guard = config,
            Err(poisoned) => *poisoned.into_inner() = config,
        }
    }
}

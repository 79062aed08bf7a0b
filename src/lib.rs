//! Warden - Background task runtime for a game server admin layer
//!
//! Runs scheduled maintenance jobs (backups, map rendering, cron commands)
//! under a shared save lock, mirrors online players into a database and
//! exposes an admin HTTP API for controlling them.

pub mod api;
pub mod config;
pub mod database;
pub mod error;
pub mod host;
pub mod models;
pub mod tasks;

#[cfg(test)]
mod test_utils;

pub use api::AppState;
pub use config::{Config, ConfigHandle};
pub use tasks::TaskSet;

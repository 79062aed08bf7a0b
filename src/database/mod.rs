//! Database Module
//!
//! Connection management for the optional SQL backend and the player
//! snapshot table.
//!
//! # Components
//! - `Backend`: supported drivers and their connection settings
//! - `ManagedConnection`: a single handle with open/validate/close
//! - `ConnectionRegistry`: the shared, lazily reopened connection

mod backend;
mod connection;
mod registry;
mod snapshot;

pub use backend::Backend;
pub use connection::{ManagedConnection, DEFAULT_VALIDITY_TIMEOUT};
pub use registry::ConnectionRegistry;
pub use snapshot::{SnapshotRow, SNAPSHOT_TABLE};

//! Error types for the task runtime and admin API
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Config Error ==
/// Failure while loading a configuration snapshot.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Properties file could not be read
    #[error("Failed to read configuration file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Properties file contains a malformed line
    #[error("Invalid configuration at line {line}: {message}")]
    Parse { line: usize, message: String },
}

// == Connection Error ==
/// Failure opening, probing or using the external database connection.
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// Database support is switched off in the configuration
    #[error("Database access is disabled")]
    Disabled,

    /// Backend name or backend settings are missing or invalid
    #[error("Database configuration invalid or missing: {0}")]
    Configuration(String),

    /// The selected backend was not compiled into this build
    #[error("Database driver '{0}' is not available")]
    MissingDriver(String),

    /// Lower-level failure reported by the database driver
    #[error("Database error: {0}")]
    Connection(#[from] sqlx::Error),

    /// Statement issued while no handle is held
    #[error("No open connection")]
    NotOpen,
}

// == Task Error ==
/// Failure inside one cycle of an external process job.
#[derive(Error, Debug)]
pub enum TaskError {
    /// The configured command is empty
    #[error("No command configured for {0}")]
    NoCommand(String),

    /// The command could not be started
    #[error("Failed to launch '{command}': {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on the child failed
    #[error("Failed to wait for '{command}': {source}")]
    Wait {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The task was stopped while the cycle was in progress
    #[error("Task cancelled")]
    Cancelled,
}

// == Api Error ==
/// Error returned by the admin HTTP API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Unknown task or entity
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request body failed validation
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Database operation failed
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Configuration reload failed
    #[error(transparent)]
    Config(#[from] ConfigError),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Connection(err) => match err {
                ConnectionError::Disabled => StatusCode::CONFLICT,
                ConnectionError::Configuration(_) => StatusCode::BAD_REQUEST,
                ConnectionError::MissingDriver(_) => StatusCode::NOT_IMPLEMENTED,
                ConnectionError::Connection(_) => StatusCode::BAD_GATEWAY,
                ConnectionError::NotOpen => StatusCode::CONFLICT,
            },
            ApiError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for admin API handlers.
pub type Result<T> = std::result::Result<T, ApiError>;

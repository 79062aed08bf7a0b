//! Response DTOs for the admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::tasks::TaskStatus;

/// Response for the task control endpoints (`POST /tasks/:name/...`)
#[derive(Debug, Clone, Serialize)]
pub struct TaskActionResponse {
    /// Action applied: `run`, `pause` or `resume`
    pub action: String,
    /// Task state right after the action
    pub task: TaskStatus,
}

impl TaskActionResponse {
    pub fn new(action: impl Into<String>, task: TaskStatus) -> Self {
        Self {
            action: action.into(),
            task,
        }
    }
}

/// Response for `POST /db/open`
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseResponse {
    pub backend: String,
    pub open: bool,
}

impl DatabaseResponse {
    pub fn new(backend: impl Into<String>, open: bool) -> Self {
        Self {
            backend: backend.into(),
            open,
        }
    }
}

/// Response for `PUT /entities`
#[derive(Debug, Clone, Serialize)]
pub struct EntitiesResponse {
    /// Number of entities now tracked
    pub count: usize,
}

/// Response for `PUT /entities/:name/visibility`
#[derive(Debug, Clone, Serialize)]
pub struct VisibilityResponse {
    pub name: String,
    pub hidden: bool,
}

/// Generic acknowledgement.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response body for health check endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status ("healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

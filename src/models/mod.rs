//! Request and Response models for the admin API
//!
//! DTOs for the JSON bodies accepted and returned by the HTTP handlers.

pub mod requests;
pub mod responses;

pub use requests::{ReplaceEntitiesRequest, VisibilityRequest};
pub use responses::{
    DatabaseResponse, EntitiesResponse, HealthResponse, MessageResponse, TaskActionResponse,
    VisibilityResponse,
};

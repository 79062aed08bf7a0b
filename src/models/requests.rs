//! Request DTOs for the admin API
//!
//! Defines the structure of incoming HTTP request bodies.

use std::collections::HashSet;

use serde::Deserialize;

use crate::host::TrackedEntity;

/// Longest player name accepted, matching the snapshot column width.
pub const MAX_NAME_LENGTH: usize = 64;

/// Request body for `PUT /entities`
///
/// Carries the complete set of online players; anything not listed is
/// dropped from the directory.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplaceEntitiesRequest {
    pub entities: Vec<TrackedEntity>,
}

impl ReplaceEntitiesRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        let mut seen = HashSet::new();

        for entity in &self.entities {
            if entity.name.is_empty() {
                return Some("Entity name cannot be empty".to_string());
            }
            if entity.name.len() > MAX_NAME_LENGTH || entity.group.len() > MAX_NAME_LENGTH {
                return Some(format!(
                    "Entity '{}' exceeds maximum name length of {} characters",
                    entity.name, MAX_NAME_LENGTH
                ));
            }
            if !seen.insert(entity.name.as_str()) {
                return Some(format!("Duplicate entity '{}'", entity.name));
            }
        }
        None
    }
}

/// Request body for `PUT /entities/:name/visibility`
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct VisibilityRequest {
    pub hidden: bool,
}

//! Tracked Entities
//!
//! In-memory directory of online players, fed by the surrounding server and
//! read by the player tracker.

use std::collections::BTreeMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

// == Dimension ==
/// World a player is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Overworld,
    Nether,
    End,
}

impl Dimension {
    /// Numeric index used by the game protocol.
    pub fn index(self) -> i32 {
        match self {
            Dimension::Overworld => 0,
            Dimension::Nether => -1,
            Dimension::End => 1,
        }
    }
}

/// Block position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

// == Tracked Entity ==
/// One online player as known to the admin layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedEntity {
    pub name: String,
    pub group: String,
    pub dimension: Dimension,
    pub position: Position,
    /// Hidden players are still recorded but flagged
    #[serde(default)]
    pub hidden: bool,
}

// == Entity Directory ==
/// Thread-safe map of tracked players keyed by name.
#[derive(Debug, Default)]
pub struct EntityDirectory {
    entities: RwLock<BTreeMap<String, TrackedEntity>>,
}

impl EntityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole set of tracked players.
    pub fn replace_all(&self, entities: Vec<TrackedEntity>) {
        let map: BTreeMap<_, _> = entities
            .into_iter()
            .map(|entity| (entity.name.clone(), entity))
            .collect();

        match self.entities.write() {
            Ok(mut guard) => *guard = map,
            Err(poisoned) => *poisoned.into_inner() = map,
        }
    }

    /// Shows or hides a player. Returns false for unknown names.
    pub fn set_hidden(&self, name: &str, hidden: bool) -> bool {
        let mut guard = match self.entities.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        match guard.get_mut(name) {
            Some(entity) => {
                entity.hidden = hidden;
                true
            }
            None => false,
        }
    }

    /// Snapshot of all tracked players ordered by name.
    pub fn snapshot(&self) -> Vec<TrackedEntity> {
        let guard = match self.entities.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        match self.entities.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

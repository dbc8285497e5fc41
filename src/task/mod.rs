//! Tasks: pre-parsed activity definitions and the requirements derived from
//! them.
//!
//! - **Conditions** ([`condition`]): the prefix-notation condition tree
//! - **Classification** ([`classify`]): substance/fillable usage, `inroom` placements
//! - **Loader** ([`loader`]): turns a [`TaskDefinition`] into a [`Task`]

pub mod classify;
pub mod condition;
pub mod loader;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

pub use condition::Condition;
pub use loader::{LoadedTask, load_task};

/// A task definition as produced by the external task-definition parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub activity: String,
    #[serde(default)]
    pub instance: u32,
    /// Raw definition text, kept for display.
    #[serde(default)]
    pub definition: String,
    /// Concept → object variables declared for it.
    pub objects: BTreeMap<String, BTreeSet<String>>,
    #[serde(default)]
    pub initial_conditions: Vec<Condition>,
    #[serde(default)]
    pub goal_conditions: Vec<Condition>,
}

impl TaskDefinition {
    /// `<activity>-<instance>`.
    pub fn name(&self) -> String {
        format!("{}-{}", self.activity, self.instance)
    }

    /// Initial conditions followed by goal conditions.
    pub fn conditions(&self) -> impl Iterator<Item = &Condition> {
        self.initial_conditions.iter().chain(&self.goal_conditions)
    }
}

/// `count` instances of `concept` needed in one room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSynsetRequirement {
    pub concept: String,
    pub count: u32,
}

/// Everything a task needs inside one room of a given type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRequirement {
    pub room_type: String,
    pub concepts: Vec<RoomSynsetRequirement>,
}

impl RoomRequirement {
    /// Total number of object instances required.
    pub fn total(&self) -> u32 {
        self.concepts.iter().map(|c| c.count).sum()
    }
}

/// A loaded task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub name: String,
    pub definition: String,
    /// Canonical concepts the task requires (the agent excluded).
    pub concepts: BTreeSet<String>,
    /// One entry per room type, sorted by room type.
    pub room_requirements: Vec<RoomRequirement>,
}

impl Task {
    pub fn room_requirement(&self, room_type: &str) -> Option<&RoomRequirement> {
        self.room_requirements
            .iter()
            .find(|r| r.room_type == room_type)
    }
}

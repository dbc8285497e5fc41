//! Catalog entities: categories of 3D models and the models themselves.

use serde::{Deserialize, Serialize};

use crate::state::State;

/// A named group of object models, optionally mapped to one concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    /// `None` while the category is uncategorized.
    pub concept: Option<String>,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            concept: None,
        }
    }
}

/// One object model in the inventory (`<category>-<model-id>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalAsset {
    pub name: String,
    /// Name before any rename was applied.
    pub original_name: String,
    pub category: String,
    /// Available in the current release.
    pub ready: bool,
    /// Listed in the future inventory.
    pub planned: bool,
}

impl PhysicalAsset {
    /// An asset that is in the future inventory but not (yet) available.
    pub fn planned(name: impl Into<String>, original_name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            category: category_of(&name).to_string(),
            original_name: original_name.into(),
            name,
            ready: false,
            planned: true,
        }
    }

    /// An asset referenced only by a room configuration.
    pub fn untracked(name: impl Into<String>, original_name: impl Into<String>) -> Self {
        Self {
            planned: false,
            ..Self::planned(name, original_name)
        }
    }

    pub fn state(&self) -> State {
        if self.ready {
            State::Matched
        } else if self.planned {
            State::Planned
        } else {
            State::Unmatched
        }
    }
}

/// Category part of an object name: everything before the first `-`.
pub fn category_of(object_name: &str) -> &str {
    object_name
        .split_once('-')
        .map_or(object_name, |(category, _)| category)
}

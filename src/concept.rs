//! Concept (synset) entities.
//!
//! A [`Concept`] row exists for every concept the catalog or a task refers to,
//! plus every taxonomy ancestor of those. Hierarchy relations are *not* stored
//! here; they are always read from the [`crate::graph::ConceptGraph`] so the
//! child/descendant views can never drift from parents/ancestors.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Property name that marks a concept as an amorphous substance.
pub const SUBSTANCE_PROPERTY: &str = "substance";

/// Property name that marks a concept as having a fillable volume.
pub const FILLABLE_PROPERTY: &str = "fillable";

/// Property annotations keyed by concept name.
pub type ConceptProperties = BTreeMap<String, BTreeSet<String>>;

/// How tasks use a concept. Flags only ever go from `false` to `true`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptUsage {
    pub used_as_substance: bool,
    pub used_as_non_substance: bool,
    pub used_as_fillable: bool,
    /// Every predicate the concept appeared as an argument of.
    pub predicates: BTreeSet<String>,
}

impl ConceptUsage {
    /// OR another observation into this one.
    pub fn merge(&mut self, other: &ConceptUsage) {
        self.used_as_substance |= other.used_as_substance;
        self.used_as_non_substance |= other.used_as_non_substance;
        self.used_as_fillable |= other.used_as_fillable;
        self.predicates.extend(other.predicates.iter().cloned());
    }
}

/// A node of the concept hierarchy as the catalog sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    pub name: String,
    #[serde(default)]
    pub definition: String,
    pub is_custom: bool,
    pub is_substance: bool,
    #[serde(default)]
    pub properties: BTreeSet<String>,
    #[serde(default)]
    pub usage: ConceptUsage,
    /// Tasks that list this concept among their required concepts.
    #[serde(default)]
    pub required_by: BTreeSet<String>,
}

impl Concept {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            definition: String::new(),
            is_custom: false,
            is_substance: false,
            properties: BTreeSet::new(),
            usage: ConceptUsage::default(),
            required_by: BTreeSet::new(),
        }
    }

    /// Replace the property set and derive `is_substance` from it.
    pub fn set_properties(&mut self, properties: BTreeSet<String>) {
        self.is_substance = properties.contains(SUBSTANCE_PROPERTY);
        self.properties = properties;
    }

    pub fn has_property(&self, property: &str) -> bool {
        self.properties.contains(property)
    }
}

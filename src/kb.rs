//! The in-memory entity collections and their derived queries.
//!
//! A [`KnowledgeBase`] is assembled by the pipeline stages and never mutated
//! after the snapshot that owns it is published.

use std::collections::{BTreeMap, BTreeSet};

use crate::catalog::{Catalog, PhysicalAsset};
use crate::concept::{Concept, ConceptProperties, ConceptUsage};
use crate::graph::ConceptGraph;
use crate::scene::Scene;
use crate::task::Task;
use crate::taxonomy::Taxonomy;

#[derive(Debug, Default)]
pub struct KnowledgeBase {
    pub graph: ConceptGraph,
    pub catalog: Catalog,
    concepts: BTreeMap<String, Concept>,
    properties: ConceptProperties,
    tasks: BTreeMap<String, Task>,
    scenes: BTreeMap<String, Scene>,
}

impl KnowledgeBase {
    pub fn new(graph: ConceptGraph, properties: ConceptProperties) -> Self {
        Self {
            graph,
            properties,
            ..Default::default()
        }
    }

    /// Register a concept if it is not known yet, filling in its definition,
    /// custom flag and property annotations.
    pub fn ensure_concept(&mut self, name: &str, taxonomy: &dyn Taxonomy) -> &mut Concept {
        let graph = &self.graph;
        let properties = &self.properties;
        self.concepts.entry(name.to_string()).or_insert_with(|| {
            let mut concept = Concept::new(name);
            concept.definition = taxonomy.definition(name).unwrap_or_default().to_string();
            concept.is_custom = graph.is_custom(name);
            if let Some(props) = properties.get(name) {
                concept.set_properties(props.clone());
            }
            concept
        })
    }

    /// Register every graph ancestor of every registered concept.
    pub fn register_ancestors(&mut self, taxonomy: &dyn Taxonomy) -> usize {
        let missing: BTreeSet<String> = self
            .concepts
            .keys()
            .flat_map(|name| self.graph.ancestors(name))
            .filter(|a| !self.concepts.contains_key(*a))
            .map(str::to_string)
            .collect();
        for name in &missing {
            self.ensure_concept(name, taxonomy);
        }
        missing.len()
    }

    /// OR observed usage into an already registered concept. Unknown names are
    /// ignored.
    pub fn record_usage(&mut self, name: &str, usage: &ConceptUsage) -> bool {
        match self.concepts.get_mut(name) {
            Some(concept) => {
                concept.usage.merge(usage);
                true
            }
            None => false,
        }
    }

    pub fn insert_task(&mut self, task: Task) {
        for concept in &task.concepts {
            if let Some(c) = self.concepts.get_mut(concept) {
                c.required_by.insert(task.name.clone());
            }
        }
        self.tasks.insert(task.name.clone(), task);
    }

    pub fn contains_task(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    pub fn set_scenes(&mut self, scenes: BTreeMap<String, Scene>) {
        self.scenes = scenes;
    }

    pub fn concept(&self, name: &str) -> Option<&Concept> {
        self.concepts.get(name)
    }

    pub fn concepts(&self) -> impl Iterator<Item = &Concept> {
        self.concepts.values()
    }

    pub fn task(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn scene(&self, name: &str) -> Option<&Scene> {
        self.scenes.get(name)
    }

    pub fn scenes(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.values()
    }

    /// Whether the concept is a node of the legal concept graph.
    pub fn is_legal(&self, name: &str) -> bool {
        self.graph.contains(name)
    }

    /// Assets whose category maps to the concept or any of its descendants.
    pub fn matching_objects(&self, concept: &str) -> Vec<&PhysicalAsset> {
        let mut out: BTreeMap<&str, &PhysicalAsset> = BTreeMap::new();
        for descendant in self.graph.descendants_inclusive(concept) {
            for category in self.catalog.categories_for_concept(descendant) {
                for asset in self.catalog.assets_in_category(&category.name) {
                    out.insert(&asset.name, asset);
                }
            }
        }
        out.into_values().collect()
    }

    /// [`Self::matching_objects`] restricted to ready assets.
    pub fn matching_ready_objects(&self, concept: &str) -> Vec<&PhysicalAsset> {
        self.matching_objects(concept)
            .into_iter()
            .filter(|a| a.ready)
            .collect()
    }

    /// Whether an asset counts for a required concept: its category's concept
    /// is the requirement or a descendant of it.
    pub fn asset_counts_for(&self, asset: &str, requirement: &str) -> bool {
        self.catalog
            .asset_concept(asset)
            .is_some_and(|concept| self.graph.counts_for(concept, requirement))
    }
}

//! Load pipeline: ordered stages that turn source data into a [`Snapshot`].
//!
//! Stages run in a fixed order (graph, catalog, tasks, scenes, hierarchy,
//! states). Any fatal error aborts the run before a snapshot exists, so a
//! partially loaded catalog is never observable.

use std::collections::BTreeSet;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::catalog::loader::{load_category_mapping, load_inventory};
use crate::catalog::{CategoryMappingRow, InventoryDocument, ObjectRename, RenameMap};
use crate::concept::ConceptProperties;
use crate::error::{KbResult, TaskError, WarningLog};
use crate::graph::{CustomConcept, build_concept_graph};
use crate::kb::KnowledgeBase;
use crate::scene::{RoomConfigDocument, check_room_types, load_scenes};
use crate::snapshot::Snapshot;
use crate::state::propagate;
use crate::task::{TaskDefinition, load_task};
use crate::taxonomy::Taxonomy;

/// Built-in load stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Build the concept graph from the taxonomy and custom rows.
    Graph,
    /// Category mapping, renames, deletion queue, inventories.
    Catalog,
    /// Task definitions, usage flags, room requirements.
    Tasks,
    /// Room configurations for both tiers.
    Scenes,
    /// Register taxonomy ancestors of every referenced concept.
    Hierarchy,
    /// Batch state propagation.
    States,
}

impl StageKind {
    pub const ORDER: [StageKind; 6] = [
        StageKind::Graph,
        StageKind::Catalog,
        StageKind::Tasks,
        StageKind::Scenes,
        StageKind::Hierarchy,
        StageKind::States,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StageKind::Graph => "graph",
            StageKind::Catalog => "catalog",
            StageKind::Tasks => "tasks",
            StageKind::Scenes => "scenes",
            StageKind::Hierarchy => "hierarchy",
            StageKind::States => "states",
        }
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every tabular/structured input besides the taxonomy, already fetched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceData {
    pub custom_concepts: Vec<CustomConcept>,
    pub properties: ConceptProperties,
    pub category_mapping: Vec<CategoryMappingRow>,
    pub inventory_future: InventoryDocument,
    pub inventory_current: InventoryDocument,
    pub rooms_future: RoomConfigDocument,
    pub rooms_current: RoomConfigDocument,
    pub tasks: Vec<TaskDefinition>,
    pub object_renames: Vec<ObjectRename>,
    pub deletion_queue: BTreeSet<String>,
    /// Room types tasks and scenes may use. Empty means unchecked.
    pub allowed_room_types: BTreeSet<String>,
}

/// Run every stage and assemble a snapshot.
pub fn build_snapshot(taxonomy: &dyn Taxonomy, data: &SourceData) -> KbResult<Snapshot> {
    let started = Instant::now();
    let mut warnings = WarningLog::new();

    let graph = build_concept_graph(taxonomy, &data.custom_concepts, &mut warnings)?;
    stage_done(StageKind::Graph, &started);

    let mut kb = KnowledgeBase::new(graph, data.properties.clone());
    let renames = RenameMap::from_rows(&data.object_renames)?;
    let mapped = load_category_mapping(
        &mut kb.catalog,
        &data.category_mapping,
        taxonomy,
        &mut warnings,
    )?;
    for concept in &mapped {
        kb.ensure_concept(concept, taxonomy);
    }
    load_inventory(
        &mut kb.catalog,
        &data.inventory_future,
        &data.inventory_current,
        &renames,
        &data.deletion_queue,
    )?;
    stage_done(StageKind::Catalog, &started);

    for definition in &data.tasks {
        let loaded = load_task(definition, taxonomy, &mut warnings)?;
        if kb.contains_task(&loaded.task.name) {
            return Err(TaskError::DuplicateTask {
                task: loaded.task.name,
            }
            .into());
        }
        for concept in &loaded.task.concepts {
            kb.ensure_concept(concept, taxonomy);
        }
        for (concept, usage) in &loaded.usage {
            if !kb.record_usage(concept, usage) {
                tracing::debug!(task = %loaded.task.name, concept = %concept, "usage for undeclared concept ignored");
            }
        }
        kb.insert_task(loaded.task);
    }
    stage_done(StageKind::Tasks, &started);

    let scenes = load_scenes(
        &mut kb.catalog,
        &data.rooms_future,
        &data.rooms_current,
        &renames,
        &mut warnings,
    )?;
    kb.set_scenes(scenes);
    let unknown = check_room_types(
        &data.allowed_room_types,
        kb.tasks(),
        kb.scenes(),
        &mut warnings,
    );
    tracing::debug!(unknown, "room types checked");
    stage_done(StageKind::Scenes, &started);

    let added = kb.register_ancestors(taxonomy);
    tracing::debug!(added, "ancestor concepts registered");
    stage_done(StageKind::Hierarchy, &started);

    let states = propagate(&kb);
    stage_done(StageKind::States, &started);

    tracing::info!(
        concepts = kb.concepts().count(),
        tasks = kb.tasks().count(),
        scenes = kb.scenes().count(),
        warnings = warnings.len(),
        "snapshot built"
    );
    Ok(Snapshot::new(kb, states, warnings))
}

fn stage_done(kind: StageKind, started: &Instant) {
    tracing::info!(
        stage = %kind,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "stage complete"
    );
}

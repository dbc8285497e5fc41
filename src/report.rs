//! Reporting facade: summaries, data-quality views, and JSON export rows.
//!
//! Everything here reads a [`Snapshot`] and never fails. Rows are plain
//! serializable structs so the CLI (or any presentation layer) can print or
//! export them as-is.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::concept::FILLABLE_PROPERTY;
use crate::scene::Tier;
use crate::snapshot::Snapshot;
use crate::state::State;

/// Headline counts for one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub tasks: BTreeMap<State, usize>,
    pub concepts: BTreeMap<State, usize>,
    pub categories: usize,
    pub assets: usize,
    pub ready_assets: usize,
    pub planned_assets: usize,
    pub scenes: usize,
    pub warnings: usize,
}

impl Summary {
    pub fn of(snapshot: &Snapshot) -> Self {
        let kb = snapshot.kb();
        let mut tasks = BTreeMap::new();
        for status in snapshot.states().tasks.values() {
            *tasks.entry(status.state).or_default() += 1;
        }
        let mut concepts = BTreeMap::new();
        for status in snapshot.states().concepts.values() {
            *concepts.entry(status.state).or_default() += 1;
        }
        Self {
            tasks,
            concepts,
            categories: kb.catalog.category_count(),
            assets: kb.catalog.asset_count(),
            ready_assets: kb.catalog.assets().filter(|a| a.ready).count(),
            planned_assets: kb.catalog.assets().filter(|a| a.planned).count(),
            scenes: kb.scenes().count(),
            warnings: snapshot.warnings().len(),
        }
    }

    pub fn task_count(&self) -> usize {
        self.tasks.values().sum()
    }

    pub fn concept_count(&self) -> usize {
        self.concepts.values().sum()
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts = |map: &BTreeMap<State, usize>| {
            State::ALL
                .iter()
                .filter_map(|s| map.get(s).map(|n| format!("{s}={n}")))
                .collect::<Vec<_>>()
                .join(" ")
        };
        writeln!(f, "tasks: {} ({})", self.task_count(), counts(&self.tasks))?;
        writeln!(
            f,
            "concepts: {} ({})",
            self.concept_count(),
            counts(&self.concepts)
        )?;
        writeln!(
            f,
            "assets: {} ({} ready, {} planned) in {} categories",
            self.assets, self.ready_assets, self.planned_assets, self.categories
        )?;
        writeln!(f, "scenes: {}", self.scenes)?;
        write!(f, "warnings: {}", self.warnings)
    }
}

/// One task as exported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskExport {
    pub name: String,
    pub state: State,
    pub synset_state: State,
    pub scene_state: State,
    pub concepts: Vec<String>,
    /// Required concepts that are illegal or unmatched.
    pub problem_concepts: Vec<String>,
    pub substance_concepts: Vec<String>,
    pub matched_scenes: Vec<String>,
    pub planned_scenes: Vec<String>,
}

/// One concept as exported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptExport {
    pub name: String,
    pub state: State,
    pub definition: String,
    pub is_custom: bool,
    pub is_substance: bool,
    pub parents: Vec<String>,
    pub children: Vec<String>,
    pub matching_objects: Vec<String>,
    pub matching_ready_objects: Vec<String>,
    pub used_as_substance: bool,
    pub used_as_non_substance: bool,
    pub used_as_fillable: bool,
    pub predicates: Vec<String>,
    pub required_by: Vec<String>,
}

/// A concept together with the tasks that need it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptNeed {
    pub name: String,
    pub state: State,
    pub required_by: Vec<String>,
}

/// A concept whose usage contradicts its annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageMismatch {
    pub name: String,
    pub problem: String,
    pub required_by: Vec<String>,
}

/// One room of a scene with its inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomExport {
    pub name: String,
    pub room_type: String,
    pub tier: Tier,
    /// `(asset, count)` pairs.
    pub objects: Vec<(String, u32)>,
}

/// One scene with its rooms and the tasks it supports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneExport {
    pub name: String,
    pub rooms: Vec<RoomExport>,
    pub matched_tasks: Vec<String>,
    pub planned_tasks: Vec<String>,
}

/// One object model and where it is placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetExport {
    pub name: String,
    pub original_name: String,
    pub category: String,
    pub concept: Option<String>,
    pub state: State,
    /// `scene/room (tier)` entries.
    pub placements: Vec<String>,
}

/// Scenes that satisfy a task, now and later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskScenes {
    pub task: String,
    pub matched: Vec<String>,
    pub planned_only: Vec<String>,
}

pub fn task_export(snapshot: &Snapshot, name: &str) -> Option<TaskExport> {
    let task = snapshot.task(name)?;
    let scenes = task_scenes(snapshot, name);
    let state_of = |c: &&String| snapshot.concept_state(c);
    Some(TaskExport {
        name: task.name.clone(),
        state: snapshot.task_state(name),
        synset_state: snapshot.task_synset_state(name),
        scene_state: snapshot.task_scene_state(name),
        concepts: task.concepts.iter().cloned().collect(),
        problem_concepts: task
            .concepts
            .iter()
            .filter(|c| matches!(state_of(c), State::Illegal | State::Unmatched))
            .cloned()
            .collect(),
        substance_concepts: task
            .concepts
            .iter()
            .filter(|c| state_of(c) == State::Substance)
            .cloned()
            .collect(),
        matched_scenes: scenes.matched,
        planned_scenes: scenes.planned_only,
    })
}

pub fn task_exports(snapshot: &Snapshot) -> Vec<TaskExport> {
    snapshot
        .kb()
        .tasks()
        .filter_map(|t| task_export(snapshot, &t.name))
        .collect()
}

pub fn concept_export(snapshot: &Snapshot, name: &str) -> Option<ConceptExport> {
    let concept = snapshot.concept(name)?;
    let graph = &snapshot.kb().graph;
    let names = |v: Vec<&str>| v.into_iter().map(str::to_string).collect::<Vec<_>>();
    Some(ConceptExport {
        name: concept.name.clone(),
        state: snapshot.concept_state(name),
        definition: concept.definition.clone(),
        is_custom: concept.is_custom,
        is_substance: concept.is_substance,
        parents: names(graph.parents(name)),
        children: names(graph.children(name)),
        matching_objects: snapshot
            .matching_objects(name)
            .into_iter()
            .map(|a| a.name.clone())
            .collect(),
        matching_ready_objects: snapshot
            .matching_ready_objects(name)
            .into_iter()
            .map(|a| a.name.clone())
            .collect(),
        used_as_substance: concept.usage.used_as_substance,
        used_as_non_substance: concept.usage.used_as_non_substance,
        used_as_fillable: concept.usage.used_as_fillable,
        predicates: concept.usage.predicates.iter().cloned().collect(),
        required_by: concept.required_by.iter().cloned().collect(),
    })
}

pub fn concept_exports(snapshot: &Snapshot) -> Vec<ConceptExport> {
    snapshot
        .kb()
        .concepts()
        .filter_map(|c| concept_export(snapshot, &c.name))
        .collect()
}

fn need(snapshot: &Snapshot, name: &str) -> ConceptNeed {
    ConceptNeed {
        name: name.to_string(),
        state: snapshot.concept_state(name),
        required_by: snapshot
            .concept(name)
            .map(|c| c.required_by.iter().cloned().collect())
            .unwrap_or_default(),
    }
}

/// Concepts outside the legal concept graph.
pub fn illegal_concepts(snapshot: &Snapshot) -> Vec<ConceptNeed> {
    snapshot
        .concepts_in_state(State::Illegal)
        .into_iter()
        .map(|c| need(snapshot, &c.name))
        .collect()
}

/// Task-required concepts without a single ready object, whatever their
/// state.
pub fn missing_concepts(snapshot: &Snapshot) -> Vec<ConceptNeed> {
    snapshot
        .kb()
        .concepts()
        .filter(|c| !c.required_by.is_empty())
        .filter(|c| snapshot.matching_ready_objects(&c.name).is_empty())
        .map(|c| need(snapshot, &c.name))
        .collect()
}

/// Concepts with categories mapped directly to them that also have hyponyms.
pub fn non_leaf_categories(snapshot: &Snapshot) -> Vec<ConceptNeed> {
    let kb = snapshot.kb();
    kb.concepts()
        .filter(|c| !kb.graph.is_leaf(&c.name) && kb.is_legal(&c.name))
        .filter(|c| {
            kb.catalog
                .categories_for_concept(&c.name)
                .any(|cat| kb.catalog.assets_in_category(&cat.name).next().is_some())
        })
        .map(|c| need(snapshot, &c.name))
        .collect()
}

/// Substance and fillable annotations that disagree with how tasks use the
/// concept.
pub fn usage_mismatches(snapshot: &Snapshot) -> Vec<UsageMismatch> {
    let mut out = Vec::new();
    for concept in snapshot.kb().concepts() {
        let usage = &concept.usage;
        let mut problems = Vec::new();
        if concept.is_substance && usage.used_as_non_substance {
            problems.push("annotated as substance but used as non-substance");
        }
        if !concept.is_substance && usage.used_as_substance {
            problems.push("used as substance but not annotated as one");
        }
        if usage.used_as_fillable && !concept.has_property(FILLABLE_PROPERTY) {
            problems.push("used as fillable but not annotated fillable");
        }
        for problem in problems {
            out.push(UsageMismatch {
                name: concept.name.clone(),
                problem: problem.to_string(),
                required_by: concept.required_by.iter().cloned().collect(),
            });
        }
    }
    out
}

pub fn task_scenes(snapshot: &Snapshot, task: &str) -> TaskScenes {
    let mut matched = Vec::new();
    let mut planned_only = Vec::new();
    for (scene, m) in snapshot.scene_matching(task) {
        if m.matched_ready {
            matched.push(scene);
        } else if m.matched_planned {
            planned_only.push(scene);
        }
    }
    TaskScenes {
        task: task.to_string(),
        matched,
        planned_only,
    }
}

/// Task × scene table for every task.
pub fn task_scene_table(snapshot: &Snapshot) -> Vec<TaskScenes> {
    snapshot
        .kb()
        .tasks()
        .map(|t| task_scenes(snapshot, &t.name))
        .collect()
}

pub fn scene_export(snapshot: &Snapshot, name: &str) -> Option<SceneExport> {
    let scene = snapshot.kb().scene(name)?;
    let mut matched_tasks = Vec::new();
    let mut planned_tasks = Vec::new();
    for task in snapshot.kb().tasks() {
        let Some(m) = snapshot.scene_matching(&task.name).remove(name) else {
            continue;
        };
        if m.matched_ready {
            matched_tasks.push(task.name.clone());
        } else if m.matched_planned {
            planned_tasks.push(task.name.clone());
        }
    }
    Some(SceneExport {
        name: scene.name.clone(),
        rooms: scene
            .rooms
            .iter()
            .map(|room| RoomExport {
                name: room.name.clone(),
                room_type: room.room_type.clone(),
                tier: room.tier,
                objects: room
                    .objects
                    .iter()
                    .map(|o| (o.asset.clone(), o.count))
                    .collect(),
            })
            .collect(),
        matched_tasks,
        planned_tasks,
    })
}

pub fn asset_export(snapshot: &Snapshot, name: &str) -> Option<AssetExport> {
    let kb = snapshot.kb();
    let asset = kb.catalog.asset(name)?;
    let mut placements = Vec::new();
    for scene in kb.scenes() {
        for room in &scene.rooms {
            if room.objects.iter().any(|o| o.asset == asset.name) {
                placements.push(format!("{}/{} ({})", scene.name, room.name, room.tier));
            }
        }
    }
    Some(AssetExport {
        name: asset.name.clone(),
        original_name: asset.original_name.clone(),
        category: asset.category.clone(),
        concept: kb.catalog.asset_concept(name).map(str::to_string),
        state: asset.state(),
        placements,
    })
}

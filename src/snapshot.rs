//! Published, immutable view of one pipeline run.
//!
//! Queries never fail: an unknown task or concept reports
//! [`State::Unmatched`] and empty collections. Reloads build a whole new
//! [`Snapshot`] and swap it into the [`SnapshotHandle`] in one step, so a
//! reader holding an `Arc<Snapshot>` never sees a half-loaded catalog.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::catalog::PhysicalAsset;
use crate::concept::Concept;
use crate::error::{DataQualityWarning, WarningLog};
use crate::kb::KnowledgeBase;
use crate::matching::SceneMatch;
use crate::state::{ConceptStatus, State, StateTable, TaskStatus};
use crate::task::Task;

#[derive(Debug)]
pub struct Snapshot {
    kb: KnowledgeBase,
    states: StateTable,
    warnings: WarningLog,
}

impl Snapshot {
    pub fn new(kb: KnowledgeBase, states: StateTable, warnings: WarningLog) -> Self {
        Self {
            kb,
            states,
            warnings,
        }
    }

    pub fn kb(&self) -> &KnowledgeBase {
        &self.kb
    }

    pub fn states(&self) -> &StateTable {
        &self.states
    }

    pub fn warnings(&self) -> &[DataQualityWarning] {
        self.warnings.as_slice()
    }

    // -- tasks ---------------------------------------------------------------

    pub fn task(&self, name: &str) -> Option<&Task> {
        self.kb.task(name)
    }

    pub fn task_status(&self, name: &str) -> Option<&TaskStatus> {
        self.states.tasks.get(name)
    }

    pub fn task_state(&self, name: &str) -> State {
        self.task_status(name).map_or(State::Unmatched, |s| s.state)
    }

    pub fn task_synset_state(&self, name: &str) -> State {
        self.task_status(name)
            .map_or(State::Unmatched, |s| s.synset_state)
    }

    pub fn task_scene_state(&self, name: &str) -> State {
        self.task_status(name)
            .map_or(State::Unmatched, |s| s.scene_state)
    }

    /// Scene name → matching result for both tiers. Empty for unknown tasks.
    pub fn scene_matching(&self, task: &str) -> BTreeMap<String, SceneMatch> {
        self.task_status(task)
            .map(|s| s.scenes.clone())
            .unwrap_or_default()
    }

    pub fn tasks_in_state(&self, state: State) -> Vec<&Task> {
        self.kb
            .tasks()
            .filter(|t| self.task_state(&t.name) == state)
            .collect()
    }

    // -- concepts ------------------------------------------------------------

    pub fn concept(&self, name: &str) -> Option<&Concept> {
        self.kb.concept(name)
    }

    pub fn concept_status(&self, name: &str) -> Option<&ConceptStatus> {
        self.states.concepts.get(name)
    }

    pub fn concept_state(&self, name: &str) -> State {
        self.concept_status(name)
            .map_or(State::Unmatched, |s| s.state)
    }

    pub fn matching_objects(&self, concept: &str) -> Vec<&PhysicalAsset> {
        if self.kb.concept(concept).is_none() {
            return Vec::new();
        }
        self.kb.matching_objects(concept)
    }

    pub fn matching_ready_objects(&self, concept: &str) -> Vec<&PhysicalAsset> {
        if self.kb.concept(concept).is_none() {
            return Vec::new();
        }
        self.kb.matching_ready_objects(concept)
    }

    pub fn concepts_in_state(&self, state: State) -> Vec<&Concept> {
        self.kb
            .concepts()
            .filter(|c| self.concept_state(&c.name) == state)
            .collect()
    }
}

/// Shared handle to the currently published snapshot.
#[derive(Debug)]
pub struct SnapshotHandle {
    current: RwLock<Arc<Snapshot>>,
}

impl SnapshotHandle {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// The snapshot readers should use right now.
    pub fn current(&self) -> Arc<Snapshot> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Replace the published snapshot. Readers that already hold the previous
    /// one keep it alive until they drop it.
    pub fn publish(&self, snapshot: Snapshot) {
        let next = Arc::new(snapshot);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = next;
    }
}

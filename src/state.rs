//! State propagation: a small status lattice for every concept and task.
//!
//! States are recomputed in one batch pass over the whole knowledge base;
//! nothing is updated incrementally. The result is a plain [`StateTable`]
//! that travels with the snapshot.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::kb::KnowledgeBase;
use crate::matching::SceneMatch;
use crate::task::Task;

/// Status of a concept, task, or asset.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum State {
    /// Ready objects exist.
    Matched,
    /// Only planned objects exist.
    Planned,
    /// Legal, but no objects at all.
    Unmatched,
    /// An amorphous material; never backed by object models.
    Substance,
    /// Not in the concept graph.
    Illegal,
}

impl State {
    pub const ALL: [State; 5] = [
        State::Matched,
        State::Planned,
        State::Unmatched,
        State::Substance,
        State::Illegal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            State::Matched => "matched",
            State::Planned => "planned",
            State::Unmatched => "unmatched",
            State::Substance => "substance",
            State::Illegal => "illegal",
        }
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived status of one concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptStatus {
    pub state: State,
    pub matching_objects: usize,
    pub matching_ready_objects: usize,
}

/// Derived status of one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub state: State,
    pub synset_state: State,
    pub scene_state: State,
    /// Scene name → per-tier matching result.
    pub scenes: BTreeMap<String, SceneMatch>,
}

/// Derived statuses for the whole knowledge base.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTable {
    pub concepts: BTreeMap<String, ConceptStatus>,
    pub tasks: BTreeMap<String, TaskStatus>,
}

/// Evaluate the concept lattice in priority order: substance, illegal,
/// matched, planned, unmatched.
pub fn concept_status(kb: &KnowledgeBase, name: &str) -> ConceptStatus {
    let matching = kb.matching_objects(name);
    let ready = matching.iter().filter(|a| a.ready).count();
    let is_substance = kb.concept(name).is_some_and(|c| c.is_substance);

    let state = if is_substance {
        State::Substance
    } else if !kb.is_legal(name) {
        State::Illegal
    } else if ready > 0 {
        State::Matched
    } else if !matching.is_empty() {
        State::Planned
    } else {
        State::Unmatched
    };

    ConceptStatus {
        state,
        matching_objects: matching.len(),
        matching_ready_objects: ready,
    }
}

/// Worst-case aggregate over a task's required concepts.
pub fn synset_state(states: impl IntoIterator<Item = State>) -> State {
    let mut any_matched = false;
    for state in states {
        match state {
            State::Illegal | State::Unmatched => return State::Unmatched,
            State::Matched => any_matched = true,
            State::Planned | State::Substance => {}
        }
    }
    if any_matched {
        State::Matched
    } else {
        State::Planned
    }
}

/// Best scene result across all scenes.
pub fn scene_state<'a>(scenes: impl IntoIterator<Item = &'a SceneMatch>) -> State {
    let mut best = State::Unmatched;
    for m in scenes {
        if m.matched_ready {
            return State::Matched;
        }
        if m.matched_planned {
            best = State::Planned;
        }
    }
    best
}

/// Conjunction of the two task dimensions.
pub fn task_state(synset: State, scene: State) -> State {
    match (synset, scene) {
        (State::Matched, State::Matched) => State::Matched,
        (State::Unmatched, _) | (_, State::Unmatched) => State::Unmatched,
        _ => State::Planned,
    }
}

fn task_status(kb: &KnowledgeBase, task: &Task, concepts: &BTreeMap<String, ConceptStatus>) -> TaskStatus {
    let synset = synset_state(task.concepts.iter().map(|c| match concepts.get(c) {
        Some(status) => status.state,
        None => concept_status(kb, c).state,
    }));

    let scenes: BTreeMap<String, SceneMatch> = kb
        .scenes()
        .map(|scene| (scene.name.clone(), SceneMatch::evaluate(kb, task, scene)))
        .collect();
    let scene = scene_state(scenes.values());

    TaskStatus {
        state: task_state(synset, scene),
        synset_state: synset,
        scene_state: scene,
        scenes,
    }
}

/// Recompute every concept and task status from scratch.
pub fn propagate(kb: &KnowledgeBase) -> StateTable {
    let concepts: BTreeMap<String, ConceptStatus> = kb
        .concepts()
        .map(|c| (c.name.clone(), concept_status(kb, &c.name)))
        .collect();

    let tasks: BTreeMap<String, TaskStatus> = kb
        .tasks()
        .map(|t| (t.name.clone(), task_status(kb, t, &concepts)))
        .collect();

    tracing::info!(
        concepts = concepts.len(),
        tasks = tasks.len(),
        matched_tasks = tasks.values().filter(|t| t.state == State::Matched).count(),
        "states propagated"
    );
    StateTable { concepts, tasks }
}

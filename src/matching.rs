//! Room-requirement matching.
//!
//! Whether a room satisfies a task's requirement for one room type is a
//! bipartite matching problem: every required object instance (left) must be
//! paired with a distinct object instance present in the room (right) whose
//! concept counts for it. The matching is computed with
//! [`petgraph::algo::maximum_matching`]; only its size per concept is observed.

use std::collections::BTreeMap;

use petgraph::algo::maximum_matching;
use petgraph::graph::{NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};

use crate::kb::KnowledgeBase;
use crate::scene::{Room, Scene, Tier};
use crate::task::{RoomRequirement, Task};

/// Unmatched instances of one required concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortfall {
    pub concept: String,
    pub missing: u32,
}

impl std::fmt::Display for Shortfall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.missing, self.concept)
    }
}

/// Outcome of matching one room against one room requirement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomMatch {
    /// Sorted by concept. Empty iff the room satisfies the requirement.
    pub shortfalls: Vec<Shortfall>,
}

impl RoomMatch {
    pub fn is_satisfied(&self) -> bool {
        self.shortfalls.is_empty()
    }
}

impl std::fmt::Display for RoomMatch {
    /// `"1 chair.n.01, 2 apple.n.01"`; empty when satisfied.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, s) in self.shortfalls.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{s}")?;
        }
        Ok(())
    }
}

/// Decide whether `room` satisfies `requirement`.
pub fn match_room(kb: &KnowledgeBase, requirement: &RoomRequirement, room: &Room) -> RoomMatch {
    let mut graph: UnGraph<(), ()> = UnGraph::default();

    let mut left: Vec<(NodeIndex, &str)> = Vec::new();
    for req in &requirement.concepts {
        for _ in 0..req.count {
            left.push((graph.add_node(()), req.concept.as_str()));
        }
    }
    let demand = left.len();

    for object in &room.objects {
        let compatible: Vec<NodeIndex> = left
            .iter()
            .filter(|(_, concept)| kb.asset_counts_for(&object.asset, concept))
            .map(|&(node, _)| node)
            .collect();
        if compatible.is_empty() {
            continue;
        }
        // More copies than required instances can never be matched.
        let copies = (object.count as usize).min(demand);
        for _ in 0..copies {
            let right = graph.add_node(());
            for &l in &compatible {
                graph.add_edge(l, right, ());
            }
        }
    }

    let matching = maximum_matching(&graph);
    let mut missing: BTreeMap<&str, u32> = BTreeMap::new();
    for &(node, concept) in &left {
        if !matching.contains_node(node) {
            *missing.entry(concept).or_default() += 1;
        }
    }

    RoomMatch {
        shortfalls: missing
            .into_iter()
            .map(|(concept, missing)| Shortfall {
                concept: concept.to_string(),
                missing,
            })
            .collect(),
    }
}

/// Outcome of matching a task against one scene at one tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierMatch {
    pub matched: bool,
    /// Why the scene does not match; empty when it does.
    pub reason: String,
}

/// Match a task against the rooms of one tier of a scene.
///
/// Every room requirement must be satisfied by a single room of its type;
/// different requirements may use different rooms. A task without room
/// requirements matches any scene.
pub fn match_scene(kb: &KnowledgeBase, task: &Task, scene: &Scene, tier: Tier) -> TierMatch {
    let mut reasons: Vec<String> = Vec::new();
    for requirement in &task.room_requirements {
        let mut failures: Vec<String> = Vec::new();
        let mut satisfied = false;
        for room in scene.rooms_of_type(&requirement.room_type, tier) {
            let result = match_room(kb, requirement, room);
            if result.is_satisfied() {
                satisfied = true;
                break;
            }
            failures.push(format!("{} is missing {result}", room.name));
        }
        if satisfied {
            continue;
        }
        if failures.is_empty() {
            reasons.push(format!("Cannot find suitable {}.", requirement.room_type));
        } else {
            reasons.push(format!(
                "Cannot find suitable {}: {}.",
                requirement.room_type,
                failures.join("; ")
            ));
        }
    }
    TierMatch {
        matched: reasons.is_empty(),
        reason: reasons.join(" "),
    }
}

/// Per-scene matching result for a task in both tiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneMatch {
    pub matched_ready: bool,
    pub reason_ready: String,
    pub matched_planned: bool,
    pub reason_planned: String,
}

impl SceneMatch {
    pub fn evaluate(kb: &KnowledgeBase, task: &Task, scene: &Scene) -> Self {
        let ready = match_scene(kb, task, scene, Tier::Ready);
        let planned = match_scene(kb, task, scene, Tier::Planned);
        Self {
            matched_ready: ready.matched,
            reason_ready: ready.reason,
            matched_planned: planned.matched,
            reason_planned: planned.reason,
        }
    }
}

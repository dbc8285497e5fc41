//! Task loading.

use std::collections::BTreeSet;

use crate::error::{TaskError, WarningLog};
use crate::graph::AGENT_CONCEPT;
use crate::taxonomy::{Taxonomy, canonicalize};

use super::classify::{UsageMap, VariableResolver, classify_usage, room_placements};
use super::{RoomRequirement, RoomSynsetRequirement, Task, TaskDefinition};

/// A task plus the concept usage observed in its conditions.
#[derive(Debug, Clone)]
pub struct LoadedTask {
    pub task: Task,
    pub usage: UsageMap,
}

/// Materialize one task definition.
///
/// Required concepts are the canonicalized declared concepts without the
/// agent. Room requirements aggregate repeated `inroom` placements of the
/// same concept into a count.
pub fn load_task(
    definition: &TaskDefinition,
    taxonomy: &dyn Taxonomy,
    warnings: &mut WarningLog,
) -> Result<LoadedTask, TaskError> {
    let name = definition.name();

    let mut resolver = VariableResolver::default();
    let mut concepts = BTreeSet::new();
    for (raw, variables) in &definition.objects {
        let raw = raw.trim();
        let canonical = canonicalize(taxonomy, raw);
        resolver.declare(raw, &canonical, variables);
        if canonical != AGENT_CONCEPT {
            concepts.insert(canonical);
        }
    }

    let usage = classify_usage(&name, definition.conditions(), &resolver, warnings);

    let room_requirements = room_placements(&name, definition.conditions(), &resolver)?
        .into_iter()
        .map(|(room_type, counts)| RoomRequirement {
            room_type,
            concepts: counts
                .into_iter()
                .map(|(concept, count)| RoomSynsetRequirement { concept, count })
                .collect(),
        })
        .collect::<Vec<_>>();

    tracing::debug!(
        task = %name,
        concepts = concepts.len(),
        rooms = room_requirements.len(),
        "task loaded"
    );

    Ok(LoadedTask {
        task: Task {
            name,
            definition: definition.definition.clone(),
            concepts,
            room_requirements,
        },
        usage,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::task::Condition;
    use crate::taxonomy::{StaticTaxonomy, TaxonomyEntry};

    fn taxonomy() -> StaticTaxonomy {
        StaticTaxonomy::new([
            TaxonomyEntry::new("stove.n.01"),
            TaxonomyEntry::new("apple.n.01").with_aliases(["malus.n.01"]),
        ])
    }

    fn objects(concept: &str, vars: &[&str]) -> (String, BTreeSet<String>) {
        (
            concept.to_string(),
            vars.iter().map(|v| v.to_string()).collect(),
        )
    }

    fn definition() -> TaskDefinition {
        TaskDefinition {
            activity: "baking_apples".into(),
            instance: 0,
            definition: "(define (problem baking_apples-0) ...)".into(),
            objects: BTreeMap::from([
                objects("malus.n.01", &["malus.n.01_1", "malus.n.01_2"]),
                objects("stove.n.01", &["stove.n.01_1"]),
                objects("agent.n.01", &["agent.n.01_1"]),
            ]),
            initial_conditions: vec![
                Condition::atom("inroom", ["malus.n.01_1", "kitchen"]),
                Condition::atom("inroom", ["malus.n.01_2", "kitchen"]),
                Condition::atom("inroom", ["stove.n.01_1", "kitchen"]),
            ],
            goal_conditions: vec![Condition::predicate(
                "forall",
                vec![
                    Condition::atom("?malus.n.01", ["-", "malus.n.01"]),
                    Condition::atom("cooked", ["?malus.n.01"]),
                ],
            )],
        }
    }

    #[test]
    fn loads_concepts_without_agent() {
        let mut log = WarningLog::new();
        let loaded = load_task(&definition(), &taxonomy(), &mut log).unwrap();
        let concepts: Vec<_> = loaded.task.concepts.iter().map(String::as_str).collect();
        assert_eq!(concepts, vec!["apple.n.01", "stove.n.01"]);
        assert_eq!(loaded.task.name, "baking_apples-0");
    }

    #[test]
    fn aggregates_room_requirements_by_canonical_concept() {
        let mut log = WarningLog::new();
        let loaded = load_task(&definition(), &taxonomy(), &mut log).unwrap();
        let kitchen = loaded.task.room_requirement("kitchen").unwrap();
        assert_eq!(
            kitchen.concepts,
            vec![
                RoomSynsetRequirement {
                    concept: "apple.n.01".into(),
                    count: 2
                },
                RoomSynsetRequirement {
                    concept: "stove.n.01".into(),
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn usage_is_keyed_by_canonical_concept() {
        let mut log = WarningLog::new();
        let loaded = load_task(&definition(), &taxonomy(), &mut log).unwrap();
        let apple = &loaded.usage["apple.n.01"];
        assert!(apple.used_as_non_substance);
        assert!(apple.predicates.contains("cooked"));
        assert!(apple.predicates.contains("inroom"));
    }
}

//! Concept graph: the public taxonomy with custom concepts grafted in.
//!
//! - **Graph** ([`ConceptGraph`]): `petgraph` DAG, hypernym → hyponym edges
//! - **Closure** ([`traverse::ClosureIndex`]): memoized ancestor/descendant sets
//!
//! [`build_concept_graph`] is the only way the rest of the engine obtains a
//! graph. Every node it produces is a *legal* concept.

pub mod index;
pub mod traverse;

use serde::{Deserialize, Serialize};

use crate::error::{DataQualityWarning, GraphError, WarningLog};
use crate::taxonomy::{Taxonomy, canonicalize};

pub use index::{ConceptGraph, GraphResult};

/// Fixed placeholder for the acting agent in task definitions.
pub const AGENT_CONCEPT: &str = "agent.n.01";

/// One row of the custom concept table: a new concept and where it attaches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomConcept {
    #[serde(rename = "custom_synset")]
    pub name: String,
    #[serde(rename = "hypernyms")]
    pub hypernym: String,
}

impl CustomConcept {
    pub fn new(name: impl Into<String>, hypernym: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hypernym: hypernym.into(),
        }
    }
}

/// Build the legal concept graph.
///
/// Adds one node per taxonomy entry and one edge per hyponym relation, then
/// attaches each custom row under its (canonicalized) hypernym. A custom row
/// must attach to a node that already exists and must not reuse a taxonomy
/// name.
pub fn build_concept_graph(
    taxonomy: &dyn Taxonomy,
    custom: &[CustomConcept],
    warnings: &mut WarningLog,
) -> GraphResult<ConceptGraph> {
    let mut graph = ConceptGraph::new();

    for name in taxonomy.all_concepts() {
        graph.add_concept(name);
    }
    for parent in taxonomy.all_concepts() {
        for child in taxonomy.hyponyms(parent) {
            let child = canonicalize(taxonomy, child);
            graph.add_edge_unchecked(parent, &child);
        }
    }
    graph.validate_acyclic()?;
    tracing::debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "taxonomy loaded"
    );

    for row in custom {
        let name = row.name.trim();
        let hypernym = row.hypernym.trim();
        if name.is_empty() || hypernym.is_empty() {
            warnings.push(DataQualityWarning::BlankCustomConcept {
                custom: row.name.clone(),
                hypernym: row.hypernym.clone(),
            });
            continue;
        }
        if taxonomy.exists(name) {
            return Err(GraphError::CustomNameCollision {
                name: name.to_string(),
            });
        }
        let hypernym = canonicalize(taxonomy, hypernym);
        if !graph.contains(&hypernym) {
            return Err(GraphError::UnknownHypernym {
                custom: name.to_string(),
                hypernym,
            });
        }
        graph.add_edge(&hypernym, name)?;
        graph.mark_custom(name);
    }

    tracing::info!(graph = %graph, "concept graph built");
    Ok(graph)
}

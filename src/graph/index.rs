//! In-memory concept graph.
//!
//! Uses `petgraph` for the hypernym → hyponym structure and a name index for
//! O(1) node lookups. The transitive closure is built lazily on first query and
//! dropped wholesale whenever the graph is mutated.

use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

use petgraph::Direction;
use petgraph::algo::{has_path_connecting, toposort};
use petgraph::graph::{DiGraph, NodeIndex};

use crate::error::GraphError;

use super::traverse::ClosureIndex;

/// Result type for graph operations.
pub type GraphResult<T> = std::result::Result<T, GraphError>;

/// Directed acyclic graph over concept names.
///
/// Edges point from hypernym to hyponym. A concept may have several parents.
/// The set of nodes is the set of *legal* concepts.
#[derive(Debug, Default)]
pub struct ConceptGraph {
    graph: DiGraph<String, ()>,
    node_index: HashMap<String, NodeIndex>,
    custom: BTreeSet<String>,
    closure: OnceLock<ClosureIndex>,
}

impl ConceptGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    fn invalidate(&mut self) {
        self.closure = OnceLock::new();
    }

    fn closure(&self) -> &ClosureIndex {
        self.closure
            .get_or_init(|| ClosureIndex::compute(&self.graph))
    }

    /// Ensure a node exists for the given concept, returning its index.
    pub fn add_concept(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.node_index.get(name) {
            return idx;
        }
        self.invalidate();
        let idx = self.graph.add_node(name.to_string());
        self.node_index.insert(name.to_string(), idx);
        idx
    }

    /// Add a hypernym → hyponym edge, creating either node if needed.
    ///
    /// Rejects edges that would close a cycle. Duplicate edges are ignored.
    pub fn add_edge(&mut self, hypernym: &str, hyponym: &str) -> GraphResult<()> {
        let parent = self.add_concept(hypernym);
        let child = self.add_concept(hyponym);
        if parent == child || has_path_connecting(&self.graph, child, parent, None) {
            return Err(GraphError::Cycle {
                parent: hypernym.to_string(),
                child: hyponym.to_string(),
            });
        }
        if self.graph.find_edge(parent, child).is_none() {
            self.invalidate();
            self.graph.add_edge(parent, child, ());
        }
        Ok(())
    }

    /// Add an edge without the per-edge cycle check. Used for bulk taxonomy
    /// loads, which must be followed by [`Self::validate_acyclic`].
    pub(super) fn add_edge_unchecked(&mut self, hypernym: &str, hyponym: &str) {
        let parent = self.add_concept(hypernym);
        let child = self.add_concept(hyponym);
        if self.graph.find_edge(parent, child).is_none() {
            self.invalidate();
            self.graph.add_edge(parent, child, ());
        }
    }

    /// Fail with an edge that closes a cycle, if there is one.
    pub fn validate_acyclic(&self) -> GraphResult<()> {
        let Err(cycle) = toposort(&self.graph, None) else {
            return Ok(());
        };
        let node = cycle.node_id();
        // Some incoming edge of a node on a cycle starts at a node it reaches.
        let parent = self
            .graph
            .neighbors_directed(node, Direction::Incoming)
            .find(|&p| has_path_connecting(&self.graph, node, p, None))
            .unwrap_or(node);
        Err(GraphError::Cycle {
            parent: self.name(parent).to_string(),
            child: self.name(node).to_string(),
        })
    }

    /// Mark a concept as a custom addition (not from the public taxonomy).
    pub fn mark_custom(&mut self, name: &str) {
        self.custom.insert(name.to_string());
    }

    pub fn is_custom(&self, name: &str) -> bool {
        self.custom.contains(name)
    }

    /// Whether the concept is legal, i.e. a node of this graph.
    pub fn contains(&self, name: &str) -> bool {
        self.node_index.contains_key(name)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All legal concept names, in no particular order.
    pub fn concepts(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(String::as_str)
    }

    fn name(&self, idx: NodeIndex) -> &str {
        self.graph[idx].as_str()
    }

    fn names(&self, nodes: &[NodeIndex]) -> Vec<&str> {
        let mut out: Vec<&str> = nodes.iter().map(|&n| self.name(n)).collect();
        out.sort_unstable();
        out
    }

    fn neighbors(&self, name: &str, dir: Direction) -> Vec<&str> {
        let Some(&idx) = self.node_index.get(name) else {
            return Vec::new();
        };
        let mut out: Vec<&str> = self
            .graph
            .neighbors_directed(idx, dir)
            .map(|n| self.name(n))
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Direct hypernyms. Excludes the concept itself.
    pub fn parents(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Incoming)
    }

    /// Direct hyponyms. Excludes the concept itself.
    pub fn children(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Outgoing)
    }

    /// Whether the concept is a legal concept without hyponyms.
    pub fn is_leaf(&self, name: &str) -> bool {
        self.node_index
            .get(name)
            .is_some_and(|&idx| self.graph.neighbors_directed(idx, Direction::Outgoing).next().is_none())
    }

    /// Transitive hypernyms, sorted by name. Excludes the concept itself.
    pub fn ancestors(&self, name: &str) -> Vec<&str> {
        match self.node_index.get(name) {
            Some(&idx) => self.names(self.closure().ancestors(idx)),
            None => Vec::new(),
        }
    }

    /// Transitive hyponyms, sorted by name. Excludes the concept itself.
    pub fn descendants(&self, name: &str) -> Vec<&str> {
        match self.node_index.get(name) {
            Some(&idx) => self.names(self.closure().descendants(idx)),
            None => Vec::new(),
        }
    }

    /// The concept followed by all of its descendants.
    ///
    /// A name that is not in the graph yields only itself, so illegal concepts
    /// still match their own directly mapped categories.
    pub fn descendants_inclusive<'a>(&'a self, name: &'a str) -> Vec<&'a str> {
        let mut out = vec![name];
        out.extend(self.descendants(name));
        out
    }

    /// Whether `concept` counts for `requirement`: it is the requirement itself
    /// or one of its descendants.
    pub fn counts_for(&self, concept: &str, requirement: &str) -> bool {
        if concept == requirement {
            return true;
        }
        match (self.node_index.get(requirement), self.node_index.get(concept)) {
            (Some(&req), Some(&con)) => self.closure().is_ancestor(req, con),
            _ => false,
        }
    }
}

impl std::fmt::Display for ConceptGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} concepts ({} custom), {} hypernym edges",
            self.node_count(),
            self.custom.len(),
            self.edge_count()
        )
    }
}

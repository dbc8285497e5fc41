//! Transitive closure over the concept DAG.
//!
//! Ancestor sets are computed in topological order: a node's ancestors are
//! its parents plus their ancestors. Descendant sets are the exact inverse.
//! Both relations are self-exclusive; callers that want the self-inclusive
//! convention add the node themselves.

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

/// Precomputed ancestor/descendant sets for every node of a graph.
///
/// Each set is a sorted, deduplicated list of node indices so membership can
/// be answered with a binary search.
#[derive(Debug, Clone, Default)]
pub struct ClosureIndex {
    ancestors: Vec<Vec<NodeIndex>>,
    descendants: Vec<Vec<NodeIndex>>,
}

impl ClosureIndex {
    /// Compute the closure of a hypernym → hyponym graph.
    ///
    /// # Panics
    ///
    /// If the graph has a cycle. Every mutation path into [`super::ConceptGraph`]
    /// rejects cycles, so reaching this is a broken invariant.
    pub fn compute<N>(graph: &DiGraph<N, ()>) -> Self {
        let order = match toposort(graph, None) {
            Ok(order) => order,
            Err(cycle) => panic!(
                "concept graph invariant violated: cycle through node {}",
                cycle.node_id().index()
            ),
        };

        let n = graph.node_count();
        let mut ancestors: Vec<Vec<NodeIndex>> = vec![Vec::new(); n];
        for &node in &order {
            let mut acc: Vec<NodeIndex> = Vec::new();
            for parent in graph.neighbors_directed(node, Direction::Incoming) {
                acc.push(parent);
                acc.extend_from_slice(&ancestors[parent.index()]);
            }
            acc.sort_unstable();
            acc.dedup();
            ancestors[node.index()] = acc;
        }

        let mut descendants: Vec<Vec<NodeIndex>> = vec![Vec::new(); n];
        for (idx, ancs) in ancestors.iter().enumerate() {
            for anc in ancs {
                descendants[anc.index()].push(NodeIndex::new(idx));
            }
        }
        // Pushed in ascending `idx` order, so already sorted.

        Self {
            ancestors,
            descendants,
        }
    }

    pub fn ancestors(&self, node: NodeIndex) -> &[NodeIndex] {
        self.ancestors
            .get(node.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn descendants(&self, node: NodeIndex) -> &[NodeIndex] {
        self.descendants
            .get(node.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether `ancestor` is a strict ancestor of `node`.
    pub fn is_ancestor(&self, ancestor: NodeIndex, node: NodeIndex) -> bool {
        self.ancestors(node).binary_search(&ancestor).is_ok()
    }
}

//! Top-level kb-audit engine facade.
//!
//! The `Engine` owns the configuration and the currently published
//! [`Snapshot`]. Every reload rebuilds a snapshot from scratch and swaps it in
//! atomically; a failed reload leaves the previous snapshot in place.

use std::sync::Arc;

use crate::config::AuditConfig;
use crate::error::KbResult;
use crate::graph::ConceptGraph;
use crate::pipeline::{SourceData, build_snapshot};
use crate::report::Summary;
use crate::snapshot::{Snapshot, SnapshotHandle};
use crate::taxonomy::Taxonomy;

/// The kb-audit engine.
pub struct Engine {
    config: AuditConfig,
    handle: SnapshotHandle,
}

impl Engine {
    /// Read every input named by the config and build the first snapshot.
    pub fn load(config: AuditConfig) -> KbResult<Self> {
        let snapshot = Self::build(&config)?;
        Ok(Self {
            config,
            handle: SnapshotHandle::new(snapshot),
        })
    }

    /// Build from in-memory sources instead of files.
    pub fn from_sources(taxonomy: &dyn Taxonomy, data: &SourceData) -> KbResult<Self> {
        Ok(Self {
            config: AuditConfig::default(),
            handle: SnapshotHandle::new(build_snapshot(taxonomy, data)?),
        })
    }

    fn build(config: &AuditConfig) -> KbResult<Snapshot> {
        let taxonomy = config.read_taxonomy()?;
        let data = config.read_sources()?;
        build_snapshot(&taxonomy, &data)
    }

    /// Re-read the configured inputs and publish a fresh snapshot.
    pub fn reload(&self) -> KbResult<()> {
        let snapshot = Self::build(&self.config)?;
        self.handle.publish(snapshot);
        tracing::info!("snapshot reloaded");
        Ok(())
    }

    /// Rebuild from in-memory sources and publish.
    pub fn reload_from(&self, taxonomy: &dyn Taxonomy, data: &SourceData) -> KbResult<()> {
        let snapshot = build_snapshot(taxonomy, data)?;
        self.handle.publish(snapshot);
        tracing::info!("snapshot reloaded");
        Ok(())
    }

    /// The currently published snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.handle.current()
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    pub fn summary(&self) -> Summary {
        Summary::of(&self.snapshot())
    }

    pub fn info(&self) -> EngineInfo {
        let snapshot = self.snapshot();
        let graph: &ConceptGraph = &snapshot.kb().graph;
        EngineInfo {
            name: self.config.name.clone(),
            graph_concepts: graph.node_count(),
            graph_edges: graph.edge_count(),
            summary: Summary::of(&snapshot),
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Summary information about the engine.
#[derive(Debug, Clone)]
pub struct EngineInfo {
    pub name: String,
    pub graph_concepts: usize,
    pub graph_edges: usize,
    pub summary: Summary,
}

impl std::fmt::Display for EngineInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "kb-audit: {}", self.name)?;
        writeln!(
            f,
            "concept graph: {} concepts, {} edges",
            self.graph_concepts, self.graph_edges
        )?;
        write!(f, "{}", self.summary)
    }
}

// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # kb-audit
//!
//! A dataset-consistency engine for a household-simulation asset catalog. It
//! cross-references symbolic task definitions against a lexical concept
//! hierarchy, a catalog of object models grouped by category, and scenes made
//! of rooms populated with objects, and answers whether each task is feasible
//! now, feasible later, or not at all.
//!
//! ## Architecture
//!
//! - **Concept graph** (`graph`): taxonomy DAG with custom concepts grafted in (petgraph)
//! - **Catalog** (`catalog`): categories, object models, inventories
//! - **Tasks** (`task`): condition trees, usage classification, room requirements
//! - **Scenes** (`scene`): rooms and their inventory, per readiness tier
//! - **Matching** (`matching`): per-room bipartite matching
//! - **States** (`state`): batch propagation of the matched/planned/unmatched lattice
//! - **Snapshots** (`snapshot`, `engine`): immutable results, swapped atomically on reload
//!
//! ## Library usage
//!
//! ```no_run
//! use kb_audit::config::AuditConfig;
//! use kb_audit::engine::Engine;
//!
//! let config = AuditConfig::load(std::path::Path::new("kb-audit.toml")).unwrap();
//! let engine = Engine::load(config).unwrap();
//! let snapshot = engine.snapshot();
//! println!("{}", snapshot.task_state("boil_water-0"));
//! ```

pub mod catalog;
pub mod concept;
pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod kb;
pub mod matching;
pub mod pipeline;
pub mod report;
pub mod scene;
pub mod snapshot;
pub mod state;
pub mod task;
pub mod taxonomy;

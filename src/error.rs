//! Rich diagnostic error types for the kb-audit engine.
//!
//! Each loader defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text so the curator of the source data knows
//! exactly which row, task, or asset broke the load. Every variant in this
//! module is fatal: the pipeline aborts and no snapshot is published.
//!
//! Non-fatal problems are [`DataQualityWarning`]s. They are logged as they are
//! found and accumulated in a [`WarningLog`] that travels with the snapshot.

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

/// Top-level error type for the kb-audit engine.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum KbError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Task(#[from] TaskError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Concept graph errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("custom concept \"{custom}\" attaches to unknown hypernym \"{hypernym}\"")]
    #[diagnostic(
        code(kb::graph::unknown_hypernym),
        help(
            "Custom concepts must attach to a concept that already exists in the taxonomy \
             or to a custom concept listed earlier. Fix the hypernym column for this row."
        )
    )]
    UnknownHypernym { custom: String, hypernym: String },

    #[error("custom concept \"{name}\" collides with an existing taxonomy concept")]
    #[diagnostic(
        code(kb::graph::name_collision),
        help("Rename the custom concept; taxonomy names cannot be redefined.")
    )]
    CustomNameCollision { name: String },

    #[error("hypernym edge \"{parent}\" -> \"{child}\" closes a cycle")]
    #[diagnostic(
        code(kb::graph::cycle),
        help(
            "The hypernym relation must be acyclic. Check the taxonomy entry or custom \
             concept row that adds this edge for a hypernym loop."
        )
    )]
    Cycle { parent: String, child: String },
}

// ---------------------------------------------------------------------------
// Catalog errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum CatalogError {
    #[error(
        "category \"{category}\" is mapped to both \"{existing}\" and \"{requested}\""
    )]
    #[diagnostic(
        code(kb::catalog::duplicate_mapping),
        help("Every category maps to exactly one concept. Remove one of the mapping rows.")
    )]
    DuplicateCategoryMapping {
        category: String,
        existing: String,
        requested: String,
    },

    #[error(
        "{asset} in category {category} is in the current inventory but not in the future inventory"
    )]
    #[diagnostic(
        code(kb::catalog::ready_not_planned),
        help(
            "The currently available assets must be a subset of the planned assets. \
             Add the asset to the future inventory or remove it from the current one."
        )
    )]
    ReadyAssetNotPlanned { asset: String, category: String },

    #[error("rename source \"{name}\" must contain exactly one '-'")]
    #[diagnostic(
        code(kb::catalog::malformed_rename),
        help("Object names follow the `<category>-<model-id>` convention.")
    )]
    MalformedRename { name: String },
}

// ---------------------------------------------------------------------------
// Task errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum TaskError {
    #[error("{task}: inroom condition {condition} is not in the correct format")]
    #[diagnostic(
        code(kb::task::malformed_inroom),
        help("An inroom condition takes exactly two arguments: an object variable and a room type.")
    )]
    MalformedInroom { task: String, condition: String },

    #[error("{task}: inroom object \"{variable}\" does not name a declared object")]
    #[diagnostic(
        code(kb::task::unknown_inroom_object),
        help("Declare the variable in the task's :objects section.")
    )]
    UnknownInroomObject { task: String, variable: String },

    #[error("task \"{task}\" is defined more than once")]
    #[diagnostic(
        code(kb::task::duplicate),
        help("Each (activity, instance) pair may only be loaded once.")
    )]
    DuplicateTask { task: String },
}

// ---------------------------------------------------------------------------
// Scene errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum SceneError {
    #[error("room {room} in {scene} ({tier}) already exists")]
    #[diagnostic(
        code(kb::scene::duplicate_room),
        help("Room names must be unique within a scene and readiness tier.")
    )]
    DuplicateRoom {
        scene: String,
        room: String,
        tier: &'static str,
    },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read {path}")]
    #[diagnostic(
        code(kb::config::read),
        help("Ensure the file exists and is readable. Relative paths resolve against the config file.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    #[diagnostic(
        code(kb::config::parse),
        help("Check the file syntax and field names against the expected document shape.")
    )]
    Parse { path: String, message: String },
}

/// Convenience alias for functions returning kb-audit results.
pub type KbResult<T> = std::result::Result<T, KbError>;

// ---------------------------------------------------------------------------
// Data-quality warnings
// ---------------------------------------------------------------------------

/// A non-fatal problem in the source data. Loading continues past it.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataQualityWarning {
    #[error("skipping category mapping row with blank field: category={category:?} synset={synset:?}")]
    BlankCategoryMapping { category: String, synset: String },

    #[error("skipping custom concept row with blank field: custom={custom:?} hypernym={hypernym:?}")]
    BlankCustomConcept { custom: String, hypernym: String },

    #[error("{task}: cannot resolve {token} to a declared object, tagging {fallback} as substance")]
    UnresolvedSubstanceVariable {
        task: String,
        token: String,
        fallback: String,
    },

    #[error("room {room} in {scene} lists {asset} with count 0")]
    ZeroCountRoomObject {
        scene: String,
        room: String,
        asset: String,
    },

    #[error("{task}: inroom room type {room_type} is not an allowed room type")]
    UnknownTaskRoomType { task: String, room_type: String },

    #[error("room {room} in {scene} has room type {room_type}, which is not an allowed room type")]
    UnknownSceneRoomType {
        scene: String,
        room: String,
        room_type: String,
    },
}

/// Accumulates warnings while a snapshot is being built.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WarningLog {
    warnings: Vec<DataQualityWarning>,
}

impl WarningLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and emit it on the `warn` level.
    pub fn push(&mut self, warning: DataQualityWarning) {
        tracing::warn!("{warning}");
        self.warnings.push(warning);
    }

    pub fn as_slice(&self) -> &[DataQualityWarning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }
}

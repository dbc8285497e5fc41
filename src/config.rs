//! Audit configuration: where the source exports live.
//!
//! ```toml
//! name = "behavior-1k"
//!
//! [inputs]
//! taxonomy = "taxonomy.json"
//! custom_concepts = "custom_synsets.json"
//! properties = "properties.json"
//! category_mapping = "category_mapping.json"
//! inventory_future = "object_inventory_future.json"
//! inventory_current = "object_inventory.json"
//! rooms_future = "combined_room_object_list_future.json"
//! rooms_current = "combined_room_object_list.json"
//! tasks = "tasks.json"
//! object_renames = "object_renames.json"
//! deletion_queue = "deletion_queue.json"
//! allowed_room_types = "allowed_room_types.json"
//! ```
//!
//! Relative paths resolve against the directory holding the config file.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::pipeline::SourceData;
use crate::taxonomy::{StaticTaxonomy, TaxonomyDocument};

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Top-level configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Dataset name shown in summaries.
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub inputs: InputPaths,
    /// Directory relative input paths resolve against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

fn default_name() -> String {
    "dataset".into()
}

/// Source files. Optional inputs default to empty data when unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputPaths {
    #[serde(default = "default_taxonomy")]
    pub taxonomy: PathBuf,
    #[serde(default = "default_custom_concepts")]
    pub custom_concepts: PathBuf,
    #[serde(default)]
    pub properties: Option<PathBuf>,
    #[serde(default = "default_category_mapping")]
    pub category_mapping: PathBuf,
    #[serde(default = "default_inventory_future")]
    pub inventory_future: PathBuf,
    #[serde(default = "default_inventory_current")]
    pub inventory_current: PathBuf,
    #[serde(default = "default_rooms_future")]
    pub rooms_future: PathBuf,
    #[serde(default = "default_rooms_current")]
    pub rooms_current: PathBuf,
    #[serde(default = "default_tasks")]
    pub tasks: PathBuf,
    #[serde(default)]
    pub object_renames: Option<PathBuf>,
    #[serde(default)]
    pub deletion_queue: Option<PathBuf>,
    /// JSON list of room types; unset skips the room-type check.
    #[serde(default)]
    pub allowed_room_types: Option<PathBuf>,
}

fn default_taxonomy() -> PathBuf {
    "taxonomy.json".into()
}
fn default_custom_concepts() -> PathBuf {
    "custom_synsets.json".into()
}
fn default_category_mapping() -> PathBuf {
    "category_mapping.json".into()
}
fn default_inventory_future() -> PathBuf {
    "object_inventory_future.json".into()
}
fn default_inventory_current() -> PathBuf {
    "object_inventory.json".into()
}
fn default_rooms_future() -> PathBuf {
    "combined_room_object_list_future.json".into()
}
fn default_rooms_current() -> PathBuf {
    "combined_room_object_list.json".into()
}
fn default_tasks() -> PathBuf {
    "tasks.json".into()
}

impl Default for InputPaths {
    fn default() -> Self {
        Self {
            taxonomy: default_taxonomy(),
            custom_concepts: default_custom_concepts(),
            properties: None,
            category_mapping: default_category_mapping(),
            inventory_future: default_inventory_future(),
            inventory_current: default_inventory_current(),
            rooms_future: default_rooms_future(),
            rooms_current: default_rooms_current(),
            tasks: default_tasks(),
            object_renames: None,
            deletion_queue: None,
            allowed_room_types: None,
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            inputs: InputPaths::default(),
            base_dir: PathBuf::from("."),
        }
    }
}

impl AuditConfig {
    /// Config with default file names rooted at `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: dir.into(),
            ..Default::default()
        }
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let mut config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        config.base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        tracing::debug!(path = %path.display(), base = %config.base_dir.display(), "config loaded");
        Ok(config)
    }

    /// Resolve an input path against the config directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn read_taxonomy(&self) -> ConfigResult<StaticTaxonomy> {
        let document: TaxonomyDocument = read_json(&self.resolve(&self.inputs.taxonomy))?;
        let taxonomy = StaticTaxonomy::from_document(document);
        tracing::info!(concepts = taxonomy.len(), "taxonomy read");
        Ok(taxonomy)
    }

    /// Read every non-taxonomy input.
    pub fn read_sources(&self) -> ConfigResult<SourceData> {
        let inputs = &self.inputs;
        let data = SourceData {
            custom_concepts: read_json(&self.resolve(&inputs.custom_concepts))?,
            properties: self.read_optional(inputs.properties.as_deref())?,
            category_mapping: read_json(&self.resolve(&inputs.category_mapping))?,
            inventory_future: read_json(&self.resolve(&inputs.inventory_future))?,
            inventory_current: read_json(&self.resolve(&inputs.inventory_current))?,
            rooms_future: read_json(&self.resolve(&inputs.rooms_future))?,
            rooms_current: read_json(&self.resolve(&inputs.rooms_current))?,
            tasks: read_json(&self.resolve(&inputs.tasks))?,
            object_renames: self.read_optional(inputs.object_renames.as_deref())?,
            deletion_queue: self.read_optional(inputs.deletion_queue.as_deref())?,
            allowed_room_types: self.read_optional(inputs.allowed_room_types.as_deref())?,
        };
        tracing::info!(
            tasks = data.tasks.len(),
            categories = data.category_mapping.len(),
            "source data read"
        );
        Ok(data)
    }

    fn read_optional<T: DeserializeOwned + Default>(&self, path: Option<&Path>) -> ConfigResult<T> {
        match path {
            Some(path) => read_json(&self.resolve(path)),
            None => Ok(T::default()),
        }
    }
}

/// Read and deserialize one JSON input file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> ConfigResult<T> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

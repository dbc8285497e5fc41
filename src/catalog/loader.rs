//! Catalog ingestion: category mapping rows, object inventories, renames and
//! the deletion queue.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, DataQualityWarning, WarningLog};
use crate::taxonomy::{Taxonomy, canonicalize};

use super::model::{PhysicalAsset, category_of};
use super::{Catalog, CatalogResult};

/// One row of the category → concept mapping table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMappingRow {
    pub category: String,
    pub synset: String,
}

impl CategoryMappingRow {
    pub fn new(category: impl Into<String>, synset: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            synset: synset.into(),
        }
    }
}

/// An object inventory export. Only the provider keys (object names) matter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryDocument {
    pub providers: BTreeMap<String, serde_json::Value>,
}

impl InventoryDocument {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            providers: names
                .into_iter()
                .map(|n| (n.into(), serde_json::Value::Null))
                .collect(),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(|k| k.trim())
    }
}

/// Moves an object model into a different category, keeping its model id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRename {
    pub object_name: String,
    pub new_category: String,
}

/// Old object name → new object name.
#[derive(Debug, Clone, Default)]
pub struct RenameMap {
    renames: HashMap<String, String>,
}

impl RenameMap {
    /// Build the map. Blank rows are skipped; a source name with anything
    /// other than exactly one `-` is rejected.
    pub fn from_rows(rows: &[ObjectRename]) -> CatalogResult<Self> {
        let mut renames = HashMap::new();
        for row in rows {
            let name = row.object_name.trim();
            if name.is_empty() {
                continue;
            }
            let mut parts = name.split('-');
            let (Some(_), Some(model_id), None) = (parts.next(), parts.next(), parts.next()) else {
                return Err(CatalogError::MalformedRename {
                    name: name.to_string(),
                });
            };
            let renamed = format!("{}-{model_id}", row.new_category.trim());
            renames.insert(name.to_string(), renamed);
        }
        Ok(Self { renames })
    }

    /// The current name for `name`, or `name` itself if it was never renamed.
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.renames.get(name).map_or(name, String::as_str)
    }

    pub fn len(&self) -> usize {
        self.renames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renames.is_empty()
    }
}

/// Apply the category mapping table.
///
/// Concept names are canonicalized first. Rows with a blank field are
/// recorded as warnings and skipped. Returns the set of concepts referenced.
pub fn load_category_mapping(
    catalog: &mut Catalog,
    rows: &[CategoryMappingRow],
    taxonomy: &dyn Taxonomy,
    warnings: &mut WarningLog,
) -> CatalogResult<BTreeSet<String>> {
    let mut concepts = BTreeSet::new();
    for row in rows {
        let category = row.category.trim();
        let synset = row.synset.trim();
        if category.is_empty() || synset.is_empty() {
            warnings.push(DataQualityWarning::BlankCategoryMapping {
                category: row.category.clone(),
                synset: row.synset.clone(),
            });
            continue;
        }
        let concept = canonicalize(taxonomy, synset);
        catalog.map_category(category, &concept)?;
        concepts.insert(concept);
    }
    tracing::info!(
        categories = catalog.category_count(),
        concepts = concepts.len(),
        "category mapping loaded"
    );
    Ok(concepts)
}

/// Load the future inventory, then mark assets from the current inventory
/// as ready.
///
/// Every asset in `current` must also be in `future`, otherwise
/// [`CatalogError::ReadyAssetNotPlanned`]. Assets in the deletion queue are
/// skipped in both inventories.
pub fn load_inventory(
    catalog: &mut Catalog,
    future: &InventoryDocument,
    current: &InventoryDocument,
    renames: &RenameMap,
    deletion_queue: &BTreeSet<String>,
) -> CatalogResult<()> {
    let mut skipped = 0usize;
    for original in future.names() {
        let name = renames.resolve(original);
        if deletion_queue.contains(name) {
            skipped += 1;
            continue;
        }
        catalog.insert_asset(PhysicalAsset::planned(name, original));
    }

    let mut ready = 0usize;
    for original in current.names() {
        let name = renames.resolve(original);
        if deletion_queue.contains(name) {
            continue;
        }
        let Some(asset) = catalog.asset_mut(name) else {
            return Err(CatalogError::ReadyAssetNotPlanned {
                asset: name.to_string(),
                category: category_of(name).to_string(),
            });
        };
        asset.ready = true;
        ready += 1;
    }

    tracing::info!(
        assets = catalog.asset_count(),
        ready,
        deleted = skipped,
        renames = renames.len(),
        "object inventory loaded"
    );
    Ok(())
}

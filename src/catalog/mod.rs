//! Object catalog: categories, physical assets, and the indexes that connect
//! them to concepts.
//!
//! The catalog is populated by [`loader`] and is read-only afterwards. All
//! collections are ordered maps so every derived listing is deterministic.

pub mod loader;
pub mod model;

use std::collections::{BTreeMap, BTreeSet};

use crate::error::CatalogError;

pub use loader::{CategoryMappingRow, InventoryDocument, ObjectRename, RenameMap};
pub use model::{Category, PhysicalAsset, category_of};

/// Result type for catalog operations.
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Categories and assets with concept/category reverse indexes.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    categories: BTreeMap<String, Category>,
    assets: BTreeMap<String, PhysicalAsset>,
    /// concept → categories mapped to exactly that concept.
    categories_by_concept: BTreeMap<String, BTreeSet<String>>,
    /// category → assets in it.
    assets_by_category: BTreeMap<String, BTreeSet<String>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the category if it does not exist yet, leaving it unmapped.
    pub fn ensure_category(&mut self, name: &str) -> &Category {
        self.categories
            .entry(name.to_string())
            .or_insert_with(|| Category::new(name))
    }

    /// Map a category to a concept.
    ///
    /// Re-mapping to the same concept is a no-op; mapping to a different one
    /// fails with [`CatalogError::DuplicateCategoryMapping`].
    pub fn map_category(&mut self, name: &str, concept: &str) -> CatalogResult<()> {
        let category = self
            .categories
            .entry(name.to_string())
            .or_insert_with(|| Category::new(name));
        match &category.concept {
            Some(existing) if existing == concept => return Ok(()),
            Some(existing) => {
                return Err(CatalogError::DuplicateCategoryMapping {
                    category: name.to_string(),
                    existing: existing.clone(),
                    requested: concept.to_string(),
                });
            }
            None => category.concept = Some(concept.to_string()),
        }
        self.categories_by_concept
            .entry(concept.to_string())
            .or_default()
            .insert(name.to_string());
        Ok(())
    }

    /// Insert or replace an asset, creating its category if needed.
    pub fn insert_asset(&mut self, asset: PhysicalAsset) {
        self.ensure_category(&asset.category);
        self.assets_by_category
            .entry(asset.category.clone())
            .or_default()
            .insert(asset.name.clone());
        self.assets.insert(asset.name.clone(), asset);
    }

    pub fn asset_mut(&mut self, name: &str) -> Option<&mut PhysicalAsset> {
        self.assets.get_mut(name)
    }

    pub fn asset(&self, name: &str) -> Option<&PhysicalAsset> {
        self.assets.get(name)
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.get(name)
    }

    pub fn contains_asset(&self, name: &str) -> bool {
        self.assets.contains_key(name)
    }

    /// Concept of the asset's category, if the category is mapped.
    pub fn asset_concept(&self, asset: &str) -> Option<&str> {
        let asset = self.assets.get(asset)?;
        self.categories.get(&asset.category)?.concept.as_deref()
    }

    /// Categories mapped directly to `concept`.
    pub fn categories_for_concept(&self, concept: &str) -> impl Iterator<Item = &Category> {
        self.categories_by_concept
            .get(concept)
            .into_iter()
            .flatten()
            .filter_map(|name| self.categories.get(name))
    }

    /// Assets belonging to `category`.
    pub fn assets_in_category(&self, category: &str) -> impl Iterator<Item = &PhysicalAsset> {
        self.assets_by_category
            .get(category)
            .into_iter()
            .flatten()
            .filter_map(|name| self.assets.get(name))
    }

    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.categories.values()
    }

    pub fn assets(&self) -> impl Iterator<Item = &PhysicalAsset> {
        self.assets.values()
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }
}

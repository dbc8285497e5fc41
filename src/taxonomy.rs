//! Lexical taxonomy provider: the public noun hierarchy concepts are drawn from.
//!
//! The engine never talks to a concrete lexical database. It consumes the
//! [`Taxonomy`] trait, and ships [`StaticTaxonomy`], an in-memory provider
//! deserialized from a JSON export of the noun synsets.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Read-only access to a hypernym/hyponym taxonomy.
///
/// Implementations must answer existence checks without failing; unknown
/// names simply do not exist.
pub trait Taxonomy {
    /// Every concept name in the taxonomy, in canonical form.
    fn all_concepts(&self) -> Vec<&str>;

    /// Direct hyponyms (children) of a concept. Empty for unknown names.
    fn hyponyms(&self, name: &str) -> Vec<&str>;

    /// Human-readable gloss, if the taxonomy has one.
    fn definition(&self, name: &str) -> Option<&str>;

    /// Whether `name` resolves to a taxonomy entry (canonical or alias).
    fn exists(&self, name: &str) -> bool {
        self.canonical_name(name).is_some()
    }

    /// The canonical spelling for `name`, if it resolves to an entry.
    fn canonical_name(&self, name: &str) -> Option<&str>;
}

/// Normalize a concept name to its canonical taxonomy form.
///
/// Names with no taxonomy match pass through unchanged; that is how custom and
/// illegal concepts keep their identity. Applying it twice is the same as
/// applying it once.
pub fn canonicalize(taxonomy: &dyn Taxonomy, name: &str) -> String {
    taxonomy
        .canonical_name(name)
        .map(str::to_string)
        .unwrap_or_else(|| name.to_string())
}

/// One concept as exported from the lexical database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyEntry {
    pub name: String,
    #[serde(default)]
    pub definition: String,
    #[serde(default)]
    pub hyponyms: Vec<String>,
    /// Alternate spellings that canonicalize to `name`.
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl TaxonomyEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = definition.into();
        self
    }

    pub fn with_hyponyms<I, S>(mut self, hyponyms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hyponyms.extend(hyponyms.into_iter().map(Into::into));
        self
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }
}

/// On-disk shape of a taxonomy export.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaxonomyDocument {
    pub concepts: Vec<TaxonomyEntry>,
}

/// In-memory taxonomy built from a list of entries.
#[derive(Debug, Clone, Default)]
pub struct StaticTaxonomy {
    entries: BTreeMap<String, TaxonomyEntry>,
    /// alias → canonical name. Never contains a canonical name as a key.
    aliases: HashMap<String, String>,
}

impl StaticTaxonomy {
    /// Build a taxonomy. Later entries with the same name are merged into the
    /// first; aliases that shadow a canonical name are ignored.
    pub fn new(entries: impl IntoIterator<Item = TaxonomyEntry>) -> Self {
        let mut merged: BTreeMap<String, TaxonomyEntry> = BTreeMap::new();
        for entry in entries {
            match merged.get_mut(&entry.name) {
                Some(existing) => {
                    if existing.definition.is_empty() {
                        existing.definition = entry.definition;
                    }
                    existing.hyponyms.extend(entry.hyponyms);
                    existing.aliases.extend(entry.aliases);
                }
                None => {
                    merged.insert(entry.name.clone(), entry);
                }
            }
        }

        let mut aliases = HashMap::new();
        for entry in merged.values() {
            for alias in &entry.aliases {
                if merged.contains_key(alias) {
                    tracing::debug!(alias = %alias, canonical = %entry.name, "alias shadows a canonical name, ignored");
                    continue;
                }
                aliases.insert(alias.clone(), entry.name.clone());
            }
        }

        Self {
            entries: merged,
            aliases,
        }
    }

    pub fn from_document(document: TaxonomyDocument) -> Self {
        Self::new(document.concepts)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Taxonomy for StaticTaxonomy {
    fn all_concepts(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    fn hyponyms(&self, name: &str) -> Vec<&str> {
        self.entries
            .get(name)
            .map(|e| e.hyponyms.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    fn definition(&self, name: &str) -> Option<&str> {
        let canonical = self.canonical_name(name)?;
        self.entries
            .get(canonical)
            .map(|e| e.definition.as_str())
            .filter(|d| !d.is_empty())
    }

    fn canonical_name(&self, name: &str) -> Option<&str> {
        if let Some((key, _)) = self.entries.get_key_value(name) {
            return Some(key.as_str());
        }
        self.aliases.get(name).map(String::as_str)
    }
}

//! Read-only item-type catalog.
//!
//! The catalog maps defindexes to display names. It is loaded once at
//! startup, validated strictly, and shared read-only; nothing mutates
//! it afterward.

use serde::Deserialize;
use std::collections::HashMap;

use crate::error::{CoreError, Result};
use crate::item::DefIndex;

/// Raw catalog entry as found in the catalog file.
///
/// Unknown fields are rejected so a malformed or mis-versioned catalog
/// fails startup instead of silently defaulting.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCatalogEntry {
    defindex: u32,
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCatalog {
    items: Vec<RawCatalogEntry>,
}

/// One item type known to the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    pub defindex: DefIndex,
    pub name: String,
}

impl CatalogItem {
    /// Whether this item type is pure currency (metal or key).
    #[must_use]
    pub fn is_currency(&self) -> bool {
        self.defindex.is_currency()
    }
}

/// Immutable item-type catalog.
#[derive(Debug, Default)]
pub struct ItemCatalog {
    items: HashMap<DefIndex, CatalogItem>,
}

impl ItemCatalog {
    /// Parse a catalog from its JSON file contents. Fails closed on any
    /// unknown field or duplicate defindex.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawCatalog = serde_json::from_str(json)?;

        let mut items = HashMap::with_capacity(raw.items.len());
        for entry in raw.items {
            let defindex = DefIndex(entry.defindex);
            if items
                .insert(
                    defindex,
                    CatalogItem {
                        defindex,
                        name: entry.name,
                    },
                )
                .is_some()
            {
                return Err(CoreError::DuplicateCatalogEntry(entry.defindex));
            }
        }

        Ok(Self { items })
    }

    /// Build a catalog directly from items (tests and wiring code).
    #[must_use]
    pub fn from_items(entries: impl IntoIterator<Item = CatalogItem>) -> Self {
        Self {
            items: entries.into_iter().map(|e| (e.defindex, e)).collect(),
        }
    }

    /// Look up an item type.
    #[must_use]
    pub fn get(&self, defindex: DefIndex) -> Option<&CatalogItem> {
        self.items.get(&defindex)
    }

    /// Display name for an item type, or a numeric placeholder when the
    /// catalog does not know it.
    #[must_use]
    pub fn name_of(&self, defindex: DefIndex) -> String {
        match self.get(defindex) {
            Some(item) => item.name.clone(),
            None => format!("item {defindex}"),
        }
    }

    /// Number of known item types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

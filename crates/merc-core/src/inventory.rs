//! Point-in-time inventory snapshots.
//!
//! A snapshot is fetched by an external collaborator and handed to the
//! trading core read-only. A snapshot may be inaccessible (private
//! backpack): every accessor then fails with
//! `CoreError::InventoryInaccessible`, which callers must surface as an
//! indeterminate outcome — "cannot verify" is never "verified".

use std::collections::HashMap;

use crate::currency::Currency;
use crate::error::{CoreError, Result};
use crate::item::{DefIndex, ItemId, ItemInstance, Quality};

/// Immutable snapshot of one party's inventory.
#[derive(Debug, Clone, Default)]
pub struct InventorySnapshot {
    items: Vec<ItemInstance>,
    by_id: HashMap<ItemId, usize>,
    private: bool,
}

impl InventorySnapshot {
    /// Snapshot of an accessible inventory. Later duplicates of an
    /// instance id silently replace earlier ones.
    #[must_use]
    pub fn accessible(items: Vec<ItemInstance>) -> Self {
        let by_id = items
            .iter()
            .enumerate()
            .map(|(idx, item)| (item.id, idx))
            .collect();
        Self {
            items,
            by_id,
            private: false,
        }
    }

    /// Marker snapshot for a private inventory.
    #[must_use]
    pub fn private() -> Self {
        Self {
            items: Vec::new(),
            by_id: HashMap::new(),
            private: true,
        }
    }

    /// Whether the inventory could not be read.
    #[must_use]
    pub fn is_private(&self) -> bool {
        self.private
    }

    fn ensure_accessible(&self) -> Result<()> {
        if self.private {
            Err(CoreError::InventoryInaccessible)
        } else {
            Ok(())
        }
    }

    /// Look up one item instance by id.
    pub fn get(&self, id: ItemId) -> Result<Option<&ItemInstance>> {
        self.ensure_accessible()?;
        Ok(self.by_id.get(&id).map(|&idx| &self.items[idx]))
    }

    /// All instances of an item type, optionally narrowed by quality.
    pub fn items_of_type(
        &self,
        defindex: DefIndex,
        quality: Option<Quality>,
    ) -> Result<Vec<&ItemInstance>> {
        self.ensure_accessible()?;
        Ok(self
            .items
            .iter()
            .filter(|item| {
                item.defindex == defindex && quality.map_or(true, |q| item.quality == q)
            })
            .collect())
    }

    /// Count of instances of an item type at a quality. Used for
    /// buy-order stock caps.
    pub fn stock_of(&self, defindex: DefIndex, quality: Quality) -> Result<usize> {
        Ok(self.items_of_type(defindex, Some(quality))?.len())
    }

    /// Total value of all currency items in the snapshot.
    pub fn total_pure(&self) -> Result<Currency> {
        self.ensure_accessible()?;
        Ok(self
            .items
            .iter()
            .filter_map(ItemInstance::currency_value)
            .sum())
    }

    /// All items, in snapshot order.
    pub fn items(&self) -> Result<&[ItemInstance]> {
        self.ensure_accessible()?;
        Ok(&self.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metal(id: u64, defindex: DefIndex) -> ItemInstance {
        ItemInstance::new(ItemId(id), defindex, Quality::Unique)
    }

    fn snapshot() -> InventorySnapshot {
        InventorySnapshot::accessible(vec![
            metal(1, DefIndex::KEY),
            metal(2, DefIndex::REFINED),
            metal(3, DefIndex::REFINED),
            metal(4, DefIndex::SCRAP),
            ItemInstance::new(ItemId(5), DefIndex(263), Quality::Vintage),
        ])
    }

    #[test]
    fn test_get_by_id() {
        let inv = snapshot();
        assert_eq!(inv.get(ItemId(1)).unwrap().unwrap().defindex, DefIndex::KEY);
        assert!(inv.get(ItemId(99)).unwrap().is_none());
    }

    #[test]
    fn test_total_pure() {
        let inv = snapshot();
        // 1 key + 2 refined + 1 scrap = 450 + 18 + 1 scrap.
        assert_eq!(inv.total_pure().unwrap(), Currency::from_scrap(469));
    }

    #[test]
    fn test_stock_of_filters_quality() {
        let inv = snapshot();
        assert_eq!(inv.stock_of(DefIndex(263), Quality::Vintage).unwrap(), 1);
        assert_eq!(inv.stock_of(DefIndex(263), Quality::Unique).unwrap(), 0);
        assert_eq!(inv.items_of_type(DefIndex::REFINED, None).unwrap().len(), 2);
    }

    #[test]
    fn test_private_inventory_fails_every_accessor() {
        let inv = InventorySnapshot::private();
        assert!(inv.is_private());
        assert!(matches!(
            inv.get(ItemId(1)),
            Err(CoreError::InventoryInaccessible)
        ));
        assert!(matches!(
            inv.total_pure(),
            Err(CoreError::InventoryInaccessible)
        ));
        assert!(matches!(
            inv.items_of_type(DefIndex::KEY, None),
            Err(CoreError::InventoryInaccessible)
        ));
    }
}

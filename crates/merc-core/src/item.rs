//! Item instances and their attributes.
//!
//! An `ItemInstance` is one concrete item in somebody's inventory:
//! a unique instance id plus the item-type (defindex), quality, and
//! the modifier flags that order matching cares about.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::currency::Currency;
use crate::error::CoreError;

/// Unique id of one item instance in an inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Item-type identifier in the external catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefIndex(pub u32);

impl DefIndex {
    /// Scrap metal.
    pub const SCRAP: Self = Self(5000);
    /// Reclaimed metal.
    pub const RECLAIMED: Self = Self(5001);
    /// Refined metal.
    pub const REFINED: Self = Self(5002);
    /// Supply crate key.
    pub const KEY: Self = Self(5021);

    /// Face value if this defindex is a currency item, else `None`.
    #[must_use]
    pub fn currency_value(self) -> Option<Currency> {
        match self {
            Self::SCRAP => Some(Currency::SCRAP),
            Self::RECLAIMED => Some(Currency::RECLAIMED),
            Self::REFINED => Some(Currency::REFINED),
            Self::KEY => Some(Currency::KEY),
            _ => None,
        }
    }

    /// Whether this item type is pure currency (metal or key).
    #[must_use]
    pub fn is_currency(self) -> bool {
        self.currency_value().is_some()
    }
}

impl fmt::Display for DefIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Item quality grade.
///
/// Codes follow the game's quality table. Unknown codes are rejected at
/// deserialization time rather than mapped to a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Quality {
    Stock,
    Genuine,
    Vintage,
    Unusual,
    Unique,
    Community,
    Valve,
    SelfMade,
    Strange,
    Haunted,
    Collectors,
}

impl Quality {
    /// Display prefix for item names ("Vintage ", "" for Unique, ...).
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Quality::Stock => "Stock ",
            Quality::Genuine => "Genuine ",
            Quality::Vintage => "Vintage ",
            Quality::Unusual => "Unusual ",
            Quality::Unique => "",
            Quality::Community => "Community ",
            Quality::Valve => "Valve ",
            Quality::SelfMade => "Self-Made ",
            Quality::Strange => "Strange ",
            Quality::Haunted => "Haunted ",
            Quality::Collectors => "Collector's ",
        }
    }

    #[must_use]
    pub fn code(self) -> u8 {
        u8::from(self)
    }
}

impl TryFrom<u8> for Quality {
    type Error = CoreError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Quality::Stock),
            1 => Ok(Quality::Genuine),
            2 => Ok(Quality::Vintage),
            5 => Ok(Quality::Unusual),
            6 => Ok(Quality::Unique),
            7 => Ok(Quality::Community),
            8 => Ok(Quality::Valve),
            9 => Ok(Quality::SelfMade),
            11 => Ok(Quality::Strange),
            13 => Ok(Quality::Haunted),
            14 => Ok(Quality::Collectors),
            other => Err(CoreError::UnknownQuality(other)),
        }
    }
}

impl From<Quality> for u8 {
    fn from(q: Quality) -> u8 {
        match q {
            Quality::Stock => 0,
            Quality::Genuine => 1,
            Quality::Vintage => 2,
            Quality::Unusual => 5,
            Quality::Unique => 6,
            Quality::Community => 7,
            Quality::Valve => 8,
            Quality::SelfMade => 9,
            Quality::Strange => 11,
            Quality::Haunted => 13,
            Quality::Collectors => 14,
        }
    }
}

/// One concrete item in an inventory snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemInstance {
    /// Unique instance id.
    pub id: ItemId,
    /// Item-type identifier.
    pub defindex: DefIndex,
    /// Quality grade.
    pub quality: Quality,
    /// Whether the item can be used in crafting.
    pub craftable: bool,
    /// Killstreak modifier present.
    pub killstreak: bool,
    /// Paint modifier present.
    pub painted: bool,
    /// Remaining uses/charges (1 for normal items).
    pub remaining_uses: u32,
}

impl ItemInstance {
    /// Plain item with no modifiers, craftable, single use.
    #[must_use]
    pub fn new(id: ItemId, defindex: DefIndex, quality: Quality) -> Self {
        Self {
            id,
            defindex,
            quality,
            craftable: true,
            killstreak: false,
            painted: false,
            remaining_uses: 1,
        }
    }

    /// Whether this instance is pure currency (metal or key).
    #[must_use]
    pub fn is_currency(&self) -> bool {
        self.defindex.is_currency()
    }

    /// Face value if this instance is a currency item.
    #[must_use]
    pub fn currency_value(&self) -> Option<Currency> {
        self.defindex.currency_value()
    }
}

//! Standing buy/sell orders.
//!
//! An order is a declarative rule: one item type, at one exact
//! quality/craftability/modifier combination, for one fixed price.
//! Orders are created by the configuration/command layer; the trading
//! core only reads and matches them.

use serde::{Deserialize, Serialize};
use std::fmt;

use merc_core::{Currency, DefIndex, ItemCatalog, ItemInstance, Quality};

/// Order direction, from the bot's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    /// The bot buys the item and pays in pure currency.
    Buy,
    /// The bot sells the item and receives pure currency.
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "buy"),
            OrderSide::Sell => write!(f, "sell"),
        }
    }
}

/// A standing offer to buy or sell one item type at a fixed price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Item type this order trades.
    pub defindex: DefIndex,
    /// Required quality, matched exactly.
    pub quality: Quality,
    /// Required craftability, matched exactly.
    pub craftable: bool,
    /// Whether a killstreak modifier is required present (true) or
    /// required absent (false). Exact match, no "either".
    pub allow_killstreak: bool,
    /// Same as `allow_killstreak`, for paint.
    pub allow_paint: bool,
    /// Fixed price in pure currency.
    pub price: Currency,
    /// Buy or sell.
    pub side: OrderSide,
    /// For buy orders: stop buying once this many are in stock.
    #[serde(default)]
    pub max_stock: Option<u32>,
}

impl Order {
    /// Plain order: craftable, no modifiers, default stock cap for buys.
    #[must_use]
    pub fn new(side: OrderSide, defindex: DefIndex, quality: Quality, price: Currency) -> Self {
        Self {
            defindex,
            quality,
            craftable: true,
            allow_killstreak: false,
            allow_paint: false,
            price,
            side,
            max_stock: match side {
                OrderSide::Buy => Some(Self::DEFAULT_MAX_STOCK),
                OrderSide::Sell => None,
            },
        }
    }

    /// Default stock cap for buy orders.
    pub const DEFAULT_MAX_STOCK: u32 = 5;

    /// Whether an item instance satisfies this order exactly.
    ///
    /// Every attribute must equal the order's requirement; there is no
    /// partial or fuzzy matching.
    #[must_use]
    pub fn matches_item(&self, item: &ItemInstance) -> bool {
        item.defindex == self.defindex
            && item.quality == self.quality
            && item.craftable == self.craftable
            && item.killstreak == self.allow_killstreak
            && item.painted == self.allow_paint
    }

    /// Name users type to select this order, e.g. "vintage ellis' cap".
    #[must_use]
    pub fn search_string(&self, catalog: &ItemCatalog) -> String {
        let mut res = format!("{}{}", self.quality.prefix(), catalog.name_of(self.defindex));
        if !self.craftable {
            res = format!("Non-craftable {res}");
        }
        res
    }

    /// Human-readable description with direction and price.
    #[must_use]
    pub fn describe(&self, catalog: &ItemCatalog) -> String {
        let verb = match self.side {
            OrderSide::Buy => "Buying",
            OrderSide::Sell => "Selling",
        };
        let mut res = format!(
            "{} {} for {}",
            verb,
            self.search_string(catalog),
            self.price.to_ref_string()
        );
        if self.allow_killstreak {
            res.push_str(" (Killstreaks allowed)");
        }
        if self.allow_paint {
            res.push_str(" (Paint allowed)");
        }
        res
    }
}

//! Auto-pay: assembling exact payment for a buy order.
//!
//! Greedy over denominations, largest first, against the bot's
//! inventory snapshot. No change-making search: if walking the ladder
//! leaves a remainder the plan fails, the caller cancels, and the other
//! side is asked to resend. A pathological stock split (plenty of
//! refined, no scrap, price ends in .11) therefore aborts a trade the
//! smarter solver could complete; in practice the bot's metal stock
//! makes this rare and the predictable behavior is worth it.

use tracing::debug;

use merc_core::{Currency, CurrencyUnit, DefIndex, InventorySnapshot, ItemId};

use crate::error::{Result, TradeError};

fn defindex_of(unit: CurrencyUnit) -> DefIndex {
    match unit {
        CurrencyUnit::Scrap => DefIndex::SCRAP,
        CurrencyUnit::Reclaimed => DefIndex::RECLAIMED,
        CurrencyUnit::Refined => DefIndex::REFINED,
        CurrencyUnit::Key => DefIndex::KEY,
    }
}

/// A concrete set of currency instances summing exactly to a price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentPlan {
    /// Instance ids to place, in selection order (largest first).
    pub item_ids: Vec<ItemId>,
    /// Always equals the requested price.
    pub total: Currency,
}

/// Assemble exact payment from `inventory`, skipping ids in `in_use`
/// (already placed in the window).
///
/// Fails with `ExactChangeUnavailable` when the greedy walk cannot hit
/// the price exactly; no partial payment is ever returned.
pub fn plan_payment(
    price: Currency,
    inventory: &InventorySnapshot,
    in_use: &[ItemId],
) -> Result<PaymentPlan> {
    let mut remaining = price;
    let mut item_ids = Vec::new();

    for unit in CurrencyUnit::DESCENDING {
        let value = unit.value();
        if remaining < value {
            continue;
        }
        for item in inventory.items_of_type(defindex_of(unit), None)? {
            if remaining < value {
                break;
            }
            if in_use.contains(&item.id) || item_ids.contains(&item.id) {
                continue;
            }
            item_ids.push(item.id);
            remaining = remaining.saturating_sub(value);
        }
    }

    if !remaining.is_zero() {
        let built = price.saturating_sub(remaining);
        debug!(%price, %built, "exact payment unavailable");
        return Err(TradeError::ExactChangeUnavailable { built, price });
    }

    debug!(%price, items = item_ids.len(), "payment plan assembled");
    Ok(PaymentPlan {
        item_ids,
        total: price,
    })
}

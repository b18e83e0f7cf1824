//! The order book: buy and sell order lists plus matching.
//!
//! Matching comes in two shapes:
//! - `match_single_item`: incremental, for items added to a live trade
//!   window (buy orders searched before sell orders, insertion order
//!   within each list).
//! - `evaluate_offer`: whole-payload, for asynchronous trade offers.
//!
//! Inventory access failures are never coerced into a yes or a no;
//! they surface as `MatchOutcome::Indeterminate` and the caller fails
//! safe.

use thiserror::Error;
use tracing::debug;

use merc_core::{CoreError, Currency, DefIndex, InventorySnapshot, ItemId, Quality};

use crate::order::{Order, OrderSide};

/// Order book errors, reported synchronously to the order-management
/// caller. They never affect an open trade session.
#[derive(Debug, Error)]
pub enum OrderBookError {
    #[error("An order already exists to {side} defindex {defindex} at quality {quality:?} for {price}")]
    Duplicate {
        side: OrderSide,
        defindex: DefIndex,
        quality: Quality,
        /// Price of the already-present order.
        price: Currency,
    },

    #[error("No {side} order exists for defindex {defindex}")]
    NotFound { side: OrderSide, defindex: DefIndex },
}

/// Result of evaluating a proposed trade against the book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Some order is satisfied by the payload.
    Matched(Order),
    /// No order is satisfied.
    NotMatched,
    /// Verification was impossible (private inventory). Distinct from
    /// `NotMatched`: the caller must not treat this as a rejection or
    /// an acceptance, only as "cannot verify".
    Indeterminate,
}

impl MatchOutcome {
    #[must_use]
    pub fn is_matched(&self) -> bool {
        matches!(self, MatchOutcome::Matched(_))
    }
}

/// Holds the standing buy and sell orders, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    buy_orders: Vec<Order>,
    sell_orders: Vec<Order>,
}

impl OrderBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a book from persisted order lists.
    #[must_use]
    pub fn from_orders(buy_orders: Vec<Order>, sell_orders: Vec<Order>) -> Self {
        Self {
            buy_orders,
            sell_orders,
        }
    }

    pub fn buy_orders(&self) -> &[Order] {
        &self.buy_orders
    }

    pub fn sell_orders(&self) -> &[Order] {
        &self.sell_orders
    }

    fn list(&self, side: OrderSide) -> &Vec<Order> {
        match side {
            OrderSide::Buy => &self.buy_orders,
            OrderSide::Sell => &self.sell_orders,
        }
    }

    fn list_mut(&mut self, side: OrderSide) -> &mut Vec<Order> {
        match side {
            OrderSide::Buy => &mut self.buy_orders,
            OrderSide::Sell => &mut self.sell_orders,
        }
    }

    /// Add an order. At most one order may exist per
    /// (item type, quality, direction); a second is a duplicate and is
    /// reported to the caller, not silently replaced.
    pub fn insert(&mut self, order: Order) -> Result<(), OrderBookError> {
        if let Some(existing) = self
            .list(order.side)
            .iter()
            .find(|o| o.defindex == order.defindex && o.quality == order.quality)
        {
            return Err(OrderBookError::Duplicate {
                side: existing.side,
                defindex: existing.defindex,
                quality: existing.quality,
                price: existing.price,
            });
        }
        self.list_mut(order.side).push(order);
        Ok(())
    }

    /// Remove the first order for an item type on a side.
    pub fn remove(
        &mut self,
        side: OrderSide,
        defindex: DefIndex,
    ) -> Result<Order, OrderBookError> {
        let list = self.list_mut(side);
        match list.iter().position(|o| o.defindex == defindex) {
            Some(idx) => Ok(list.remove(idx)),
            None => Err(OrderBookError::NotFound { side, defindex }),
        }
    }

    /// Re-price an existing order.
    pub fn set_price(
        &mut self,
        side: OrderSide,
        defindex: DefIndex,
        quality: Quality,
        price: Currency,
    ) -> Result<(), OrderBookError> {
        let order = self
            .list_mut(side)
            .iter_mut()
            .find(|o| o.defindex == defindex && o.quality == quality)
            .ok_or(OrderBookError::NotFound { side, defindex })?;
        order.price = price;
        Ok(())
    }

    /// All orders: sell orders first, then buy orders (listing order of
    /// the original command surface).
    pub fn all_orders(&self) -> impl Iterator<Item = &Order> {
        self.sell_orders.iter().chain(self.buy_orders.iter())
    }

    /// First order whose attributes exactly equal the item's.
    ///
    /// Buy orders are searched before sell orders; insertion order
    /// within each list.
    #[must_use]
    pub fn match_single_item(&self, item: &merc_core::ItemInstance) -> Option<&Order> {
        self.buy_orders
            .iter()
            .chain(self.sell_orders.iter())
            .find(|o| o.matches_item(item))
    }

    /// Evaluate a full proposed trade payload against every order.
    ///
    /// `their_items`/`my_items` are the instance ids each side offers;
    /// instances are resolved through the matching inventory snapshot.
    /// If no order matches definitively and at least one evaluation hit
    /// an inaccessible inventory, the result is `Indeterminate`.
    #[must_use]
    pub fn evaluate_offer(
        &self,
        their_items: &[ItemId],
        my_items: &[ItemId],
        my_inventory: &InventorySnapshot,
        their_inventory: &InventorySnapshot,
    ) -> MatchOutcome {
        let mut indeterminate = false;

        for order in self.buy_orders.iter().chain(self.sell_orders.iter()) {
            match offer_satisfies(order, their_items, my_items, my_inventory, their_inventory) {
                Ok(true) => {
                    debug!(side = %order.side, defindex = %order.defindex, "offer matched order");
                    return MatchOutcome::Matched(order.clone());
                }
                Ok(false) => {}
                Err(CoreError::InventoryInaccessible) => indeterminate = true,
                Err(_) => {}
            }
        }

        if indeterminate {
            MatchOutcome::Indeterminate
        } else {
            MatchOutcome::NotMatched
        }
    }
}

/// Whether one order is satisfied by an offer payload.
///
/// Buy order: every item the bot is asked to give must be pure currency
/// ("I only pay in pure on buy orders"), the total given must not
/// exceed the order price, and at least one of their items must match
/// the order exactly.
///
/// Sell order: their currency total must reach the price, and the bot
/// must be asked to give exactly one item, which matches the order.
fn offer_satisfies(
    order: &Order,
    their_items: &[ItemId],
    my_items: &[ItemId],
    my_inventory: &InventorySnapshot,
    their_inventory: &InventorySnapshot,
) -> Result<bool, CoreError> {
    match order.side {
        OrderSide::Buy => {
            let mut paying = Currency::ZERO;
            for id in my_items {
                let Some(item) = my_inventory.get(*id)? else {
                    return Ok(false);
                };
                match item.currency_value() {
                    Some(value) => paying += value,
                    None => return Ok(false),
                }
            }
            if paying > order.price {
                return Ok(false);
            }

            for id in their_items {
                if let Some(item) = their_inventory.get(*id)? {
                    if order.matches_item(item) {
                        return Ok(true);
                    }
                }
            }
            Ok(false)
        }
        OrderSide::Sell => {
            let mut paid = Currency::ZERO;
            for id in their_items {
                if let Some(item) = their_inventory.get(*id)? {
                    if let Some(value) = item.currency_value() {
                        paid += value;
                    }
                }
            }
            if paid < order.price {
                return Ok(false);
            }

            let [only] = my_items else {
                return Ok(false);
            };
            match my_inventory.get(*only)? {
                Some(item) => Ok(order.matches_item(item)),
                None => Ok(false),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use merc_core::{ItemInstance, Quality};

    const CAP: DefIndex = DefIndex(263);

    fn cap_order(side: OrderSide, price_ref: &str) -> Order {
        Order::new(side, CAP, Quality::Unique, Currency::parse_ref(price_ref).unwrap())
    }

    fn item(id: u64, defindex: DefIndex) -> ItemInstance {
        ItemInstance::new(ItemId(id), defindex, Quality::Unique)
    }

    fn ids(items: &[ItemInstance]) -> Vec<ItemId> {
        items.iter().map(|i| i.id).collect()
    }

    // ========================================================================
    // Insertion / duplicates
    // ========================================================================

    #[test]
    fn test_insert_duplicate_reports_existing() {
        let mut book = OrderBook::new();
        book.insert(cap_order(OrderSide::Buy, "2.33")).unwrap();

        let err = book.insert(cap_order(OrderSide::Buy, "3.00")).unwrap_err();
        match err {
            OrderBookError::Duplicate { price, .. } => {
                assert_eq!(price, Currency::parse_ref("2.33").unwrap());
            }
            other => panic!("expected duplicate, got {other:?}"),
        }

        // Same item on the other side is fine.
        book.insert(cap_order(OrderSide::Sell, "3.00")).unwrap();
    }

    #[test]
    fn test_remove_and_set_price() {
        let mut book = OrderBook::new();
        book.insert(cap_order(OrderSide::Sell, "2.33")).unwrap();

        book.set_price(OrderSide::Sell, CAP, Quality::Unique, Currency::KEY)
            .unwrap();
        assert_eq!(book.sell_orders()[0].price, Currency::KEY);

        book.remove(OrderSide::Sell, CAP).unwrap();
        assert!(book.sell_orders().is_empty());
        assert!(book.remove(OrderSide::Sell, CAP).is_err());
    }

    // ========================================================================
    // match_single_item
    // ========================================================================

    #[test]
    fn test_buy_orders_searched_before_sell() {
        let mut book = OrderBook::new();
        book.insert(cap_order(OrderSide::Sell, "3.00")).unwrap();
        book.insert(cap_order(OrderSide::Buy, "2.00")).unwrap();

        let matched = book.match_single_item(&item(1, CAP)).unwrap();
        assert_eq!(matched.side, OrderSide::Buy);
    }

    #[test]
    fn test_match_single_item_exact_attributes() {
        let mut book = OrderBook::new();
        book.insert(cap_order(OrderSide::Buy, "2.00")).unwrap();

        let mut painted = item(1, CAP);
        painted.painted = true;
        assert!(book.match_single_item(&painted).is_none());
        assert!(book.match_single_item(&item(1, DefIndex(264))).is_none());
    }

    // ========================================================================
    // evaluate_offer — buy orders
    // ========================================================================

    #[test]
    fn test_buy_offer_matches() {
        let mut book = OrderBook::new();
        book.insert(cap_order(OrderSide::Buy, "2.00")).unwrap();

        let mine = vec![item(1, DefIndex::REFINED), item(2, DefIndex::REFINED)];
        let theirs = vec![item(10, CAP)];
        let my_inv = InventorySnapshot::accessible(mine.clone());
        let their_inv = InventorySnapshot::accessible(theirs.clone());

        let outcome = book.evaluate_offer(&ids(&theirs), &ids(&mine), &my_inv, &their_inv);
        assert!(outcome.is_matched());
    }

    #[test]
    fn test_buy_offer_rejects_non_pure_payment() {
        let mut book = OrderBook::new();
        book.insert(cap_order(OrderSide::Buy, "2.00")).unwrap();

        // Asked to give a hat alongside metal: reject even though the
        // currency total alone would be within price.
        let mine = vec![item(1, DefIndex::REFINED), item(2, DefIndex(264))];
        let theirs = vec![item(10, CAP)];
        let my_inv = InventorySnapshot::accessible(mine.clone());
        let their_inv = InventorySnapshot::accessible(theirs.clone());

        let outcome = book.evaluate_offer(&ids(&theirs), &ids(&mine), &my_inv, &their_inv);
        assert_eq!(outcome, MatchOutcome::NotMatched);
    }

    #[test]
    fn test_buy_offer_rejects_overpayment() {
        let mut book = OrderBook::new();
        book.insert(cap_order(OrderSide::Buy, "2.00")).unwrap();

        let mine = vec![
            item(1, DefIndex::REFINED),
            item(2, DefIndex::REFINED),
            item(3, DefIndex::REFINED),
        ];
        let theirs = vec![item(10, CAP)];
        let my_inv = InventorySnapshot::accessible(mine.clone());
        let their_inv = InventorySnapshot::accessible(theirs.clone());

        let outcome = book.evaluate_offer(&ids(&theirs), &ids(&mine), &my_inv, &their_inv);
        assert_eq!(outcome, MatchOutcome::NotMatched);
    }

    // ========================================================================
    // evaluate_offer — sell orders
    // ========================================================================

    #[test]
    fn test_sell_offer_matches_exact_payment() {
        let mut book = OrderBook::new();
        book.insert(cap_order(OrderSide::Sell, "2.00")).unwrap();

        let mine = vec![item(1, CAP)];
        let theirs = vec![item(10, DefIndex::REFINED), item(11, DefIndex::REFINED)];
        let my_inv = InventorySnapshot::accessible(mine.clone());
        let their_inv = InventorySnapshot::accessible(theirs.clone());

        let outcome = book.evaluate_offer(&ids(&theirs), &ids(&mine), &my_inv, &their_inv);
        assert!(outcome.is_matched());
    }

    #[test]
    fn test_sell_offer_rejects_two_items_from_me() {
        let mut book = OrderBook::new();
        book.insert(cap_order(OrderSide::Sell, "2.00")).unwrap();

        // Asked to give two items: not a single-item sale, even though
        // the payment is exactly the price.
        let mine = vec![item(1, CAP), item(2, CAP)];
        let theirs = vec![item(10, DefIndex::REFINED), item(11, DefIndex::REFINED)];
        let my_inv = InventorySnapshot::accessible(mine.clone());
        let their_inv = InventorySnapshot::accessible(theirs.clone());

        let outcome = book.evaluate_offer(&ids(&theirs), &ids(&mine), &my_inv, &their_inv);
        assert_eq!(outcome, MatchOutcome::NotMatched);
    }

    #[test]
    fn test_sell_offer_rejects_underpayment() {
        let mut book = OrderBook::new();
        book.insert(cap_order(OrderSide::Sell, "2.00")).unwrap();

        let mine = vec![item(1, CAP)];
        let theirs = vec![item(10, DefIndex::REFINED)];
        let my_inv = InventorySnapshot::accessible(mine.clone());
        let their_inv = InventorySnapshot::accessible(theirs.clone());

        let outcome = book.evaluate_offer(&ids(&theirs), &ids(&mine), &my_inv, &their_inv);
        assert_eq!(outcome, MatchOutcome::NotMatched);
    }

    // ========================================================================
    // Indeterminate propagation
    // ========================================================================

    #[test]
    fn test_private_inventory_is_indeterminate_not_rejected() {
        let mut book = OrderBook::new();
        book.insert(cap_order(OrderSide::Buy, "2.00")).unwrap();

        let mine = vec![item(1, DefIndex::REFINED)];
        let my_inv = InventorySnapshot::accessible(mine.clone());
        let their_inv = InventorySnapshot::private();

        let outcome =
            book.evaluate_offer(&[ItemId(10)], &ids(&mine), &my_inv, &their_inv);
        assert_eq!(outcome, MatchOutcome::Indeterminate);
    }

    #[test]
    fn test_empty_book_is_not_matched() {
        let book = OrderBook::new();
        let inv = InventorySnapshot::accessible(vec![]);
        let outcome = book.evaluate_offer(&[], &[], &inv, &inv);
        assert_eq!(outcome, MatchOutcome::NotMatched);
    }
}

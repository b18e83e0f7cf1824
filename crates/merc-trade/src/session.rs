//! Live trade session state.
//!
//! A session tracks one open trade window: the items each side has
//! placed, readiness, accept signals, and the running total the other
//! side has paid. The session never talks to the transport itself; the
//! event handler reads and mutates it and emits `TradeAction`s for the
//! polling worker to execute.

use tracing::{debug, info};

use merc_core::{Currency, InventorySnapshot, ItemId};
use merc_orders::Order;

use crate::transport::Party;

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// The exchange completed.
    Success,
    /// Cancelled by either side.
    Cancelled,
    /// The other side went silent past the allowed gap, or the trade
    /// ran past its overall limit.
    TimedOut,
    /// The exchange is held pending an email confirmation. Not a
    /// failure: the items may still move later.
    AwaitingEmailConfirmation,
    /// Something went wrong (transport failures, unassemblable
    /// payment).
    Error(String),
}

/// Session lifecycle. Transitions only move forward:
/// `Created -> Negotiating -> Closing -> Closed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TradeState {
    /// Allocated, inventories fetched, window not yet live.
    Created,
    /// The window is live and events are flowing.
    Negotiating,
    /// A close has been decided; teardown actions may still be pending.
    Closing(CloseReason),
    /// Fully torn down.
    Closed(CloseReason),
}

/// State of one open trade window.
#[derive(Debug)]
pub struct TradeSession {
    other_id: u64,
    trusted: bool,
    state: TradeState,
    /// Instance ids on the bot's side of the window, in placement order.
    my_items: Vec<ItemId>,
    /// Instance ids on the other side of the window, in placement order.
    their_items: Vec<ItemId>,
    my_ready: bool,
    their_ready: bool,
    /// Set once the other side signals accept; from then on timeouts no
    /// longer apply (the remaining wait is on the bot, not on them).
    other_accepted: bool,
    /// Running total of currency the other side has placed.
    amount_paid: Currency,
    /// The order the current negotiation is bound to, if any.
    active_order: Option<Order>,
    my_inventory: InventorySnapshot,
    their_inventory: InventorySnapshot,
}

impl TradeSession {
    #[must_use]
    pub fn new(
        other_id: u64,
        trusted: bool,
        my_inventory: InventorySnapshot,
        their_inventory: InventorySnapshot,
    ) -> Self {
        Self {
            other_id,
            trusted,
            state: TradeState::Created,
            my_items: Vec::new(),
            their_items: Vec::new(),
            my_ready: false,
            their_ready: false,
            other_accepted: false,
            amount_paid: Currency::ZERO,
            active_order: None,
            my_inventory,
            their_inventory,
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Mark the window live. No-op unless the session is freshly
    /// created.
    pub fn begin(&mut self) {
        if self.state == TradeState::Created {
            info!(other_id = self.other_id, "trade session negotiating");
            self.state = TradeState::Negotiating;
        }
    }

    /// Decide a close. Idempotent: the first reason wins and later
    /// calls are ignored, so a timeout firing while a cancel is in
    /// flight cannot flip the recorded reason.
    pub fn close(&mut self, reason: CloseReason) {
        match self.state {
            TradeState::Closing(_) | TradeState::Closed(_) => {
                debug!(other_id = self.other_id, ?reason, "close ignored, already closing");
            }
            _ => {
                info!(other_id = self.other_id, ?reason, "trade session closing");
                self.state = TradeState::Closing(reason);
            }
        }
    }

    /// Complete teardown: `Closing` becomes `Closed`.
    pub fn finalize(&mut self) {
        if let TradeState::Closing(reason) = &self.state {
            self.state = TradeState::Closed(reason.clone());
        }
    }

    /// Whether events should still be processed.
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self.state, TradeState::Created | TradeState::Negotiating)
    }

    #[must_use]
    pub fn state(&self) -> &TradeState {
        &self.state
    }

    // ========================================================================
    // Window bookkeeping
    // ========================================================================

    /// Record an item placed into the window. Duplicate ids are
    /// ignored; order of first placement is preserved.
    pub fn record_item_added(&mut self, party: Party, id: ItemId) {
        let list = self.items_mut(party);
        if !list.contains(&id) {
            list.push(id);
        }
    }

    /// Record an item pulled out of the window.
    pub fn record_item_removed(&mut self, party: Party, id: ItemId) {
        self.items_mut(party).retain(|existing| *existing != id);
    }

    fn items_mut(&mut self, party: Party) -> &mut Vec<ItemId> {
        match party {
            Party::Bot => &mut self.my_items,
            Party::Other => &mut self.their_items,
        }
    }

    pub fn set_ready(&mut self, party: Party, ready: bool) {
        match party {
            Party::Bot => self.my_ready = ready,
            Party::Other => self.their_ready = ready,
        }
    }

    pub fn record_accept(&mut self, party: Party) {
        if party == Party::Other {
            self.other_accepted = true;
        }
    }

    /// Bind the negotiation to an order. The payment tally is left
    /// alone: it mirrors the currency physically in the window, which
    /// may have been placed before the matched item.
    pub fn bind_order(&mut self, order: Order) {
        self.active_order = Some(order);
    }

    /// Drop the order binding (the matched item left the window).
    pub fn clear_order(&mut self) {
        self.active_order = None;
    }

    pub fn add_paid(&mut self, amount: Currency) {
        self.amount_paid += amount;
    }

    pub fn subtract_paid(&mut self, amount: Currency) {
        self.amount_paid = self.amount_paid.saturating_sub(amount);
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[must_use]
    pub fn other_id(&self) -> u64 {
        self.other_id
    }

    /// Whether the other side may bypass validation on accept.
    #[must_use]
    pub fn is_trusted(&self) -> bool {
        self.trusted
    }

    #[must_use]
    pub fn my_items(&self) -> &[ItemId] {
        &self.my_items
    }

    #[must_use]
    pub fn their_items(&self) -> &[ItemId] {
        &self.their_items
    }

    #[must_use]
    pub fn my_ready(&self) -> bool {
        self.my_ready
    }

    #[must_use]
    pub fn their_ready(&self) -> bool {
        self.their_ready
    }

    #[must_use]
    pub fn other_accepted(&self) -> bool {
        self.other_accepted
    }

    #[must_use]
    pub fn amount_paid(&self) -> Currency {
        self.amount_paid
    }

    #[must_use]
    pub fn active_order(&self) -> Option<&Order> {
        self.active_order.as_ref()
    }

    #[must_use]
    pub fn my_inventory(&self) -> &InventorySnapshot {
        &self.my_inventory
    }

    #[must_use]
    pub fn their_inventory(&self) -> &InventorySnapshot {
        &self.their_inventory
    }
}

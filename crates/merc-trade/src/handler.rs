//! Trade event handling.
//!
//! `OrderHandler` is the policy layer: it receives polled `TradeEvent`s,
//! mutates the session, and emits `TradeAction`s for the polling worker
//! to execute. It holds no transport handle and does no waiting, so the
//! whole negotiation logic is testable with plain synchronous calls.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use merc_core::{ItemCatalog, ItemInstance};
use merc_orders::{Order, OrderBook, OrderSide};

use crate::chat;
use crate::payment;
use crate::session::{CloseReason, TradeSession};
use crate::transport::{Party, RemoteClose, TradeAction, TradeEvent};
use crate::validate;

/// Policy hook the polling worker drives. Implemented by
/// `OrderHandler`; tests may substitute their own.
pub trait TradeEventSink: Send + Sync {
    /// Called once when the window goes live.
    fn on_session_start(&self, session: &mut TradeSession) -> Vec<TradeAction>;

    /// Called for every polled event, in order.
    fn on_event(&self, session: &mut TradeSession, event: TradeEvent) -> Vec<TradeAction>;
}

/// Drives negotiations from the standing order book.
pub struct OrderHandler {
    catalog: Arc<ItemCatalog>,
    book: Arc<RwLock<OrderBook>>,
}

impl OrderHandler {
    #[must_use]
    pub fn new(catalog: Arc<ItemCatalog>, book: Arc<RwLock<OrderBook>>) -> Self {
        Self { catalog, book }
    }

    // ========================================================================
    // Their items
    // ========================================================================

    fn on_their_item_added(
        &self,
        session: &mut TradeSession,
        item: &ItemInstance,
    ) -> Vec<TradeAction> {
        session.record_item_added(Party::Other, item.id);

        if let Some(value) = item.currency_value() {
            session.add_paid(value);
            return self.payment_feedback(session);
        }

        let matched = {
            let book = self.book.read();
            book.match_single_item(item)
                .filter(|order| order.side == OrderSide::Buy)
                .cloned()
        };

        let Some(order) = matched else {
            return vec![TradeAction::SendTradeMessage(format!(
                "I am not buying your {}. Type \"listall\" to see my orders.",
                self.catalog.name_of(item.defindex)
            ))];
        };

        // One purchase per session: a second item, matched or not, is
        // asked back out rather than re-priced.
        if session.active_order().is_some() {
            return vec![TradeAction::SendTradeMessage(
                "Please trade one item at a time.".to_string(),
            )];
        }

        self.bind_and_pay(session, order)
    }

    /// Gate a buy order (stock cap, funds), bind it, and rebuild the
    /// bot's side with exact payment for the matched item.
    fn bind_and_pay(&self, session: &mut TradeSession, order: Order) -> Vec<TradeAction> {
        let name = order.search_string(&self.catalog);

        let stock = match session
            .my_inventory()
            .stock_of(order.defindex, order.quality)
        {
            Ok(count) => count,
            Err(err) => {
                warn!(error = %err, "could not read own inventory");
                return vec![TradeAction::SendTradeMessage(
                    "I can't read my own backpack right now, sorry.".to_string(),
                )];
            }
        };
        if let Some(cap) = order.max_stock {
            if stock >= cap as usize {
                return vec![TradeAction::SendTradeMessage(format!(
                    "I already have all the {name} I need, sorry."
                ))];
            }
        }

        let owed = order.price;

        match session.my_inventory().total_pure() {
            Ok(pure) if pure < owed => {
                return vec![TradeAction::SendTradeMessage(format!(
                    "I don't have enough currency to buy your {name} right now."
                ))];
            }
            Ok(_) => {}
            Err(err) => {
                warn!(error = %err, "could not read own inventory");
                return vec![TradeAction::SendTradeMessage(
                    "I can't read my own backpack right now, sorry.".to_string(),
                )];
            }
        }

        match payment::plan_payment(owed, session.my_inventory(), &[]) {
            Ok(plan) => {
                info!(
                    other_id = session.other_id(),
                    item = %name,
                    owed = %owed,
                    "buy order bound, payment assembled"
                );
                let describe = order.describe(&self.catalog);
                session.bind_order(order);
                let mut actions = vec![
                    TradeAction::SendTradeMessage(describe),
                    TradeAction::RemoveAllItems,
                ];
                actions.extend(plan.item_ids.into_iter().map(TradeAction::AddItem));
                actions.push(TradeAction::SendTradeMessage(format!(
                    "I have added my payment of {}. Toggle ready when you are.",
                    owed.to_ref_string()
                )));
                actions
            }
            Err(err) => {
                warn!(error = %err, "auto-pay failed, cancelling");
                session.close(CloseReason::Error(err.to_string()));
                vec![
                    TradeAction::SendChatMessage(
                        "I have encountered an error. Please send the trade again.".to_string(),
                    ),
                    TradeAction::Cancel,
                ]
            }
        }
    }

    /// How many of their windowed items match an order.
    fn matched_copies(&self, session: &TradeSession, order: &Order) -> u64 {
        session
            .their_items()
            .iter()
            .filter(|id| {
                matches!(
                    session.their_inventory().get(**id),
                    Ok(Some(item)) if order.matches_item(item)
                )
            })
            .count() as u64
    }

    fn on_their_item_removed(
        &self,
        session: &mut TradeSession,
        item: &ItemInstance,
    ) -> Vec<TradeAction> {
        session.record_item_removed(Party::Other, item.id);

        if let Some(value) = item.currency_value() {
            session.subtract_paid(value);
            return Vec::new();
        }

        // If the bound buy item left the window, unbind and take the
        // payment back.
        let unbind = session
            .active_order()
            .filter(|order| order.side == OrderSide::Buy)
            .map(|order| self.matched_copies(session, order) == 0)
            .unwrap_or(false);
        if unbind {
            debug!(other_id = session.other_id(), "bound item withdrawn, unbinding");
            session.clear_order();
            return vec![TradeAction::RemoveAllItems];
        }
        Vec::new()
    }

    // ========================================================================
    // Payment feedback (sell orders)
    // ========================================================================

    fn payment_feedback(&self, session: &TradeSession) -> Vec<TradeAction> {
        let Some(order) = session.active_order() else {
            return Vec::new();
        };
        if order.side != OrderSide::Sell {
            return vec![TradeAction::SendTradeMessage(
                "You don't need to pay me anything; I am the one buying.".to_string(),
            )];
        }

        let paid = session.amount_paid();
        if paid == order.price {
            vec![TradeAction::SendTradeMessage(
                "That is the correct amount, thank you. Toggle ready when you are.".to_string(),
            )]
        } else if paid > order.price {
            vec![TradeAction::SendTradeMessage(format!(
                "You are paying {} too much. Please remove it.",
                paid.saturating_sub(order.price).to_ref_string()
            ))]
        } else {
            vec![TradeAction::SendTradeMessage(format!(
                "{} to go.",
                order.price.saturating_sub(paid).to_ref_string()
            ))]
        }
    }

    // ========================================================================
    // Ready / accept
    // ========================================================================

    fn on_their_ready_changed(&self, session: &mut TradeSession, ready: bool) -> Vec<TradeAction> {
        session.set_ready(Party::Other, ready);

        if !ready {
            // Mirror them: never stay readied against an unready peer.
            return vec![TradeAction::SetReady(false)];
        }

        let report = validate::validate(session);
        if report.is_valid() {
            vec![TradeAction::SetReady(true)]
        } else {
            report
                .reasons()
                .iter()
                .map(|reason| TradeAction::SendTradeMessage(reason.clone()))
                .collect()
        }
    }

    fn on_their_accept(&self, session: &mut TradeSession) -> Vec<TradeAction> {
        session.record_accept(Party::Other);

        let report = validate::validate(session);
        if report.is_valid() || session.is_trusted() {
            if !report.is_valid() {
                warn!(
                    other_id = session.other_id(),
                    reasons = ?report.reasons(),
                    "accepting invalid window from trusted peer"
                );
            }
            vec![TradeAction::Accept]
        } else {
            report
                .reasons()
                .iter()
                .map(|reason| TradeAction::SendTradeMessage(reason.clone()))
                .collect()
        }
    }

    fn on_remote_close(&self, session: &mut TradeSession, close: RemoteClose) -> Vec<TradeAction> {
        let reason = match close {
            RemoteClose::Completed => CloseReason::Success,
            RemoteClose::Cancelled => CloseReason::Cancelled,
            RemoteClose::AwaitingEmailConfirmation => CloseReason::AwaitingEmailConfirmation,
        };
        session.close(reason);
        Vec::new()
    }
}

impl TradeEventSink for OrderHandler {
    fn on_session_start(&self, session: &mut TradeSession) -> Vec<TradeAction> {
        session.begin();
        vec![
            TradeAction::SendTradeMessage(
                "Hello! Put up the items you want to sell me, or type \"buy <item name>\"."
                    .to_string(),
            ),
            TradeAction::SendTradeMessage("Type \"help\" for the full list of commands.".to_string()),
        ]
    }

    fn on_event(&self, session: &mut TradeSession, event: TradeEvent) -> Vec<TradeAction> {
        if !session.is_open() {
            debug!(other_id = session.other_id(), "event after close, dropped");
            return Vec::new();
        }

        match event {
            TradeEvent::ItemAdded {
                party: Party::Other,
                item,
            } => self.on_their_item_added(session, &item),
            TradeEvent::ItemRemoved {
                party: Party::Other,
                item,
            } => self.on_their_item_removed(session, &item),
            TradeEvent::ItemAdded {
                party: Party::Bot,
                item,
            } => {
                session.record_item_added(Party::Bot, item.id);
                Vec::new()
            }
            TradeEvent::ItemRemoved {
                party: Party::Bot,
                item,
            } => {
                session.record_item_removed(Party::Bot, item.id);
                Vec::new()
            }
            TradeEvent::ReadyChanged {
                party: Party::Other,
                ready,
            } => self.on_their_ready_changed(session, ready),
            TradeEvent::ReadyChanged {
                party: Party::Bot,
                ready,
            } => {
                session.set_ready(Party::Bot, ready);
                Vec::new()
            }
            TradeEvent::AcceptSignaled {
                party: Party::Other,
            } => self.on_their_accept(session),
            TradeEvent::AcceptSignaled { party: Party::Bot } => Vec::new(),
            TradeEvent::Message(text) => {
                let book = self.book.read();
                chat::handle_trade_message(session, &book, &self.catalog, &text)
            }
            TradeEvent::Closed(close) => self.on_remote_close(session, close),
        }
    }
}

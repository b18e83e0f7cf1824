//! The validation gate.
//!
//! Run before the bot readies up and again before it accepts. The gate
//! collects EVERY failure reason rather than stopping at the first, so
//! the other side learns everything wrong with the window at once.
//! Inability to verify (private backpack, stale snapshot) is itself a
//! failure reason: the gate fails safe.

use tracing::debug;

use merc_core::Currency;
use merc_orders::OrderSide;

use crate::session::TradeSession;

/// Outcome of the gate: valid iff no reasons were collected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    reasons: Vec<String>,
}

impl ValidationReport {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.reasons.is_empty()
    }

    #[must_use]
    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }

    fn push(&mut self, reason: impl Into<String>) {
        self.reasons.push(reason.into());
    }
}

/// Check the window contents against the bound order.
#[must_use]
pub fn validate(session: &TradeSession) -> ValidationReport {
    let mut report = ValidationReport::default();

    if session.their_items().is_empty() {
        report.push("You must put up at least one item.");
        return report;
    }

    let Some(order) = session.active_order() else {
        report.push("I am not buying those items. Type \"help\" in the trade window for instructions.");
        return report;
    };

    if session.their_inventory().is_private() {
        report.push("I can't verify your items because your backpack is private.");
        return report;
    }

    match order.side {
        OrderSide::Sell => validate_sale(session, order, &mut report),
        OrderSide::Buy => validate_purchase(session, order, &mut report),
    }

    debug!(
        other_id = session.other_id(),
        valid = report.is_valid(),
        reasons = report.reasons().len(),
        "validated trade window"
    );
    report
}

/// Sell order: their side is payment, the bot's side is exactly the
/// item being sold. Payment must equal the price to the scrap.
fn validate_sale(session: &TradeSession, order: &merc_orders::Order, report: &mut ValidationReport) {
    let mut paid = Currency::ZERO;
    for id in session.their_items() {
        match session.their_inventory().get(*id) {
            Ok(Some(item)) => match item.currency_value() {
                Some(value) => paid += value,
                None => report.push(
                    "I only accept pure currency (scrap, reclaimed, refined, keys) as payment.",
                ),
            },
            Ok(None) | Err(_) => {
                report.push("I can't verify one of the items you put up.");
            }
        }
    }

    if paid < order.price {
        let shortfall = order.price.saturating_sub(paid);
        report.push(format!("You still owe me {}.", shortfall.to_ref_string()));
    } else if paid > order.price {
        let excess = paid.saturating_sub(order.price);
        report.push(format!(
            "You are paying {} too much. Please remove it.",
            excess.to_ref_string()
        ));
    }

    match session.my_items() {
        [only] => match session.my_inventory().get(*only) {
            Ok(Some(item)) if order.matches_item(item) => {}
            _ => report.push("The item on my side is not the one you are buying."),
        },
        [] => report.push("I haven't put the item up yet. Please wait."),
        _ => report.push("I should only be giving one item in this trade."),
    }
}

/// Buy order: their side is exactly the one item being bought and
/// nothing else; the bot's side is pure currency assembled by
/// auto-pay, equal to the price.
fn validate_purchase(
    session: &TradeSession,
    order: &merc_orders::Order,
    report: &mut ValidationReport,
) {
    match session.their_items() {
        [only] => match session.their_inventory().get(*only) {
            Ok(Some(item)) if order.matches_item(item) => {}
            Ok(Some(_)) => report.push("I am not buying the item you put up."),
            Ok(None) | Err(_) => report.push("I can't verify the item you put up."),
        },
        _ => report.push("Please trade one item at a time."),
    }

    let mut paying = Currency::ZERO;
    for id in session.my_items() {
        match session.my_inventory().get(*id) {
            Ok(Some(item)) => match item.currency_value() {
                Some(value) => paying += value,
                None => report.push("I should only be paying in pure currency."),
            },
            Ok(None) | Err(_) => {
                report.push("I can't verify one of my own items.");
            }
        }
    }

    if paying != order.price {
        report.push(format!(
            "My payment of {} does not match the {} owed. Please resend the trade.",
            paying.to_ref_string(),
            order.price.to_ref_string()
        ));
    }
}

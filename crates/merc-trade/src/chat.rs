//! Trade-window chat commands.
//!
//! The other side drives purchases by typing into the trade window:
//! `buy <item>` binds one of the bot's sell orders and puts the item
//! up, `listall`/`showall` enumerate the standing orders, `clear`
//! empties the bot's side, `cancel`/`exit` abort. Anything else is
//! ignored rather than answered, to keep the window readable.

use tracing::debug;

use merc_core::ItemCatalog;
use merc_orders::{Order, OrderBook, OrderSide};

use crate::session::{CloseReason, TradeSession};
use crate::transport::TradeAction;

const HELP_LINES: [&str; 4] = [
    "Here's how to trade with me:",
    "Type \"buy <item name>\" and I will put the item up; pay the exact price and toggle ready.",
    "To sell me items, just put them in the trade window and I will pay if I have a matching order.",
    "Other commands: \"listall\" (everything I trade), \"clear\" (empty my side), \"cancel\" (abort).",
];

/// Handle one chat line typed into the trade window.
pub fn handle_trade_message(
    session: &mut TradeSession,
    book: &OrderBook,
    catalog: &ItemCatalog,
    message: &str,
) -> Vec<TradeAction> {
    let trimmed = message.trim();
    let lower = trimmed.to_ascii_lowercase();

    match lower.as_str() {
        "help" => HELP_LINES
            .iter()
            .map(|line| TradeAction::SendTradeMessage((*line).to_string()))
            .collect(),
        "listall" | "showall" => list_orders(book, catalog),
        "clear" => vec![TradeAction::RemoveAllItems],
        "cancel" | "exit" => {
            session.close(CloseReason::Cancelled);
            vec![
                TradeAction::SendTradeMessage("Trade cancelled.".to_string()),
                TradeAction::Cancel,
            ]
        }
        "buy" => vec![TradeAction::SendTradeMessage(
            "Usage: buy <item name>. Type \"listall\" to see what I sell.".to_string(),
        )],
        _ => match lower.strip_prefix("buy ") {
            Some(query) => start_purchase(session, book, catalog, query.trim()),
            None => {
                debug!(other_id = session.other_id(), "ignoring trade chat line");
                Vec::new()
            }
        },
    }
}

fn list_orders(book: &OrderBook, catalog: &ItemCatalog) -> Vec<TradeAction> {
    let lines: Vec<TradeAction> = book
        .all_orders()
        .map(|order| TradeAction::SendTradeMessage(order.describe(catalog)))
        .collect();
    if lines.is_empty() {
        vec![TradeAction::SendTradeMessage(
            "I have no orders right now.".to_string(),
        )]
    } else {
        lines
    }
}

/// Resolve `buy <query>` against the sell orders: exact name match
/// first, then unique substring match, otherwise disambiguate.
fn start_purchase(
    session: &mut TradeSession,
    book: &OrderBook,
    catalog: &ItemCatalog,
    query: &str,
) -> Vec<TradeAction> {
    let named: Vec<(Order, String)> = book
        .sell_orders()
        .iter()
        .map(|order| {
            let name = order.search_string(catalog).to_ascii_lowercase();
            (order.clone(), name)
        })
        .collect();

    let order = if let Some((order, _)) = named.iter().find(|(_, name)| name == query) {
        order
    } else {
        let partial: Vec<&(Order, String)> = named
            .iter()
            .filter(|(_, name)| name.contains(query))
            .collect();
        match partial.as_slice() {
            [] => {
                return vec![TradeAction::SendTradeMessage(format!(
                    "I am not selling anything called \"{query}\". Type \"listall\" to see my orders."
                ))];
            }
            [(order, _)] => order,
            many => {
                let mut actions = vec![TradeAction::SendTradeMessage(
                    "That matches more than one item. Did you mean:".to_string(),
                )];
                actions.extend(many.iter().map(|(order, _)| {
                    TradeAction::SendTradeMessage(format!("- {}", order.search_string(catalog)))
                }));
                return actions;
            }
        }
    };

    put_up_for_sale(session, order.clone(), catalog)
}

fn put_up_for_sale(
    session: &mut TradeSession,
    order: Order,
    catalog: &ItemCatalog,
) -> Vec<TradeAction> {
    debug_assert_eq!(order.side, OrderSide::Sell);

    let stock = match session.my_inventory().items_of_type(order.defindex, Some(order.quality)) {
        Ok(items) => items
            .into_iter()
            .find(|item| order.matches_item(item) && !session.my_items().contains(&item.id))
            .map(|item| item.id),
        Err(_) => {
            return vec![TradeAction::SendTradeMessage(
                "I can't read my own backpack right now, sorry. Try again later.".to_string(),
            )];
        }
    };

    let Some(item_id) = stock else {
        return vec![TradeAction::SendTradeMessage(format!(
            "I am out of stock on {}.",
            order.search_string(catalog)
        ))];
    };

    let price = order.price;
    let name = order.search_string(catalog);
    session.bind_order(order);

    vec![
        TradeAction::AddItem(item_id),
        TradeAction::SendTradeMessage(format!(
            "That will be {} for the {}. Pay exactly that and toggle ready.",
            price.to_ref_string(),
            name
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use merc_core::{
        CatalogItem, Currency, DefIndex, InventorySnapshot, ItemId, ItemInstance, Quality,
    };

    const CAP: DefIndex = DefIndex(263);
    const SPECS: DefIndex = DefIndex(638);

    fn catalog() -> ItemCatalog {
        ItemCatalog::from_items([
            CatalogItem {
                defindex: CAP,
                name: "Ellis' Cap".to_string(),
            },
            CatalogItem {
                defindex: SPECS,
                name: "Pyrovision Goggles".to_string(),
            },
        ])
    }

    fn book() -> OrderBook {
        let mut book = OrderBook::new();
        book.insert(Order::new(
            OrderSide::Sell,
            CAP,
            Quality::Unique,
            Currency::parse_ref("2.33").unwrap(),
        ))
        .unwrap();
        book.insert(Order::new(
            OrderSide::Sell,
            SPECS,
            Quality::Unique,
            Currency::parse_ref("1.00").unwrap(),
        ))
        .unwrap();
        book
    }

    fn session_with_stock() -> TradeSession {
        let mine = vec![ItemInstance::new(ItemId(1), CAP, Quality::Unique)];
        let mut s = TradeSession::new(
            7,
            false,
            InventorySnapshot::accessible(mine),
            InventorySnapshot::accessible(vec![]),
        );
        s.begin();
        s
    }

    #[test]
    fn test_buy_exact_name_binds_and_adds() {
        let mut s = session_with_stock();
        let actions = handle_trade_message(&mut s, &book(), &catalog(), "buy ellis' cap");
        assert_eq!(actions[0], TradeAction::AddItem(ItemId(1)));
        assert!(matches!(
            &actions[1],
            TradeAction::SendTradeMessage(m) if m.contains("2.33 ref")
        ));
        assert!(s.active_order().is_some());
    }

    #[test]
    fn test_buy_substring_match() {
        let mut s = session_with_stock();
        let actions = handle_trade_message(&mut s, &book(), &catalog(), "buy ellis");
        assert_eq!(actions[0], TradeAction::AddItem(ItemId(1)));
    }

    #[test]
    fn test_buy_unknown_item() {
        let mut s = session_with_stock();
        let actions = handle_trade_message(&mut s, &book(), &catalog(), "buy rocket launcher");
        assert!(matches!(
            &actions[0],
            TradeAction::SendTradeMessage(m) if m.contains("not selling")
        ));
        assert!(s.active_order().is_none());
    }

    #[test]
    fn test_buy_ambiguous_disambiguates() {
        let mut s = session_with_stock();
        // "s" is in both "ellis' cap" and "pyrovision goggles".
        let actions = handle_trade_message(&mut s, &book(), &catalog(), "buy s");
        assert!(actions.len() >= 3);
        assert!(matches!(
            &actions[0],
            TradeAction::SendTradeMessage(m) if m.contains("more than one")
        ));
        assert!(s.active_order().is_none());
    }

    #[test]
    fn test_buy_out_of_stock() {
        let mut s = TradeSession::new(
            7,
            false,
            InventorySnapshot::accessible(vec![]),
            InventorySnapshot::accessible(vec![]),
        );
        s.begin();
        let actions = handle_trade_message(&mut s, &book(), &catalog(), "buy ellis' cap");
        assert!(matches!(
            &actions[0],
            TradeAction::SendTradeMessage(m) if m.contains("out of stock")
        ));
        assert!(s.active_order().is_none());
    }

    #[test]
    fn test_listall_describes_every_order() {
        let mut s = session_with_stock();
        let actions = handle_trade_message(&mut s, &book(), &catalog(), "listall");
        assert_eq!(actions.len(), 2);
    }

    #[test]
    fn test_cancel_closes_session() {
        let mut s = session_with_stock();
        let actions = handle_trade_message(&mut s, &book(), &catalog(), "cancel");
        assert!(actions.contains(&TradeAction::Cancel));
        assert!(!s.is_open());
    }

    #[test]
    fn test_unrelated_chatter_ignored() {
        let mut s = session_with_stock();
        assert!(handle_trade_message(&mut s, &book(), &catalog(), "hello there").is_empty());
    }
}

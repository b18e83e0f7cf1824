//! End-to-end negotiation tests over a scripted fake transport.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use merc_core::{
    CatalogItem, Currency, DefIndex, InventorySnapshot, ItemCatalog, ItemId, ItemInstance, Quality,
};
use merc_orders::{Order, OrderBook, OrderSide};
use merc_trade::{
    BoxFuture, CloseReason, InventoryProvider, OrderHandler, Party, RemoteClose, TradeEvent,
    TradeError, TradeManager, TradeTimingConfig, TradeTransport, TransportError,
};

const BOT_ID: u64 = 1;
const OTHER_ID: u64 = 7;
const CAP: DefIndex = DefIndex(263);

// ============================================================================
// Fakes
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Logged {
    TradeMsg(String),
    ChatMsg(String),
    Add(ItemId),
    RemoveAll,
    Ready(bool),
    Accept,
    Cancel,
}

struct FakeTransport {
    script: Mutex<VecDeque<Vec<TradeEvent>>>,
    log: Mutex<Vec<Logged>>,
    fail_polls: bool,
}

impl FakeTransport {
    fn scripted(batches: Vec<Vec<TradeEvent>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(batches.into()),
            log: Mutex::new(Vec::new()),
            fail_polls: false,
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            log: Mutex::new(Vec::new()),
            fail_polls: true,
        })
    }

    fn log(&self) -> Vec<Logged> {
        self.log.lock().clone()
    }

    fn record(&self, entry: Logged) -> BoxFuture<'_, Result<(), TransportError>> {
        self.log.lock().push(entry);
        Box::pin(async { Ok(()) })
    }
}

impl TradeTransport for FakeTransport {
    fn poll(&self) -> BoxFuture<'_, Result<Vec<TradeEvent>, TransportError>> {
        let result = if self.fail_polls {
            Err(TransportError::new("connection reset"))
        } else {
            Ok(self.script.lock().pop_front().unwrap_or_default())
        };
        Box::pin(async move { result })
    }

    fn add_item(&self, id: ItemId) -> BoxFuture<'_, Result<bool, TransportError>> {
        self.log.lock().push(Logged::Add(id));
        Box::pin(async { Ok(true) })
    }

    fn remove_all_items(&self) -> BoxFuture<'_, Result<(), TransportError>> {
        self.record(Logged::RemoveAll)
    }

    fn set_ready(&self, ready: bool) -> BoxFuture<'_, Result<(), TransportError>> {
        self.record(Logged::Ready(ready))
    }

    fn accept(&self) -> BoxFuture<'_, Result<bool, TransportError>> {
        self.log.lock().push(Logged::Accept);
        Box::pin(async { Ok(true) })
    }

    fn cancel(&self) -> BoxFuture<'_, Result<(), TransportError>> {
        self.record(Logged::Cancel)
    }

    fn send_trade_message(&self, text: &str) -> BoxFuture<'_, Result<(), TransportError>> {
        self.record(Logged::TradeMsg(text.to_string()))
    }

    fn send_chat_message(&self, text: &str) -> BoxFuture<'_, Result<(), TransportError>> {
        self.record(Logged::ChatMsg(text.to_string()))
    }
}

struct FakeInventories {
    snapshots: HashMap<u64, InventorySnapshot>,
    fail: bool,
}

impl InventoryProvider for FakeInventories {
    fn fetch(&self, user_id: u64) -> BoxFuture<'_, Result<InventorySnapshot, TransportError>> {
        let result = if self.fail {
            Err(TransportError::new("backpack service unavailable"))
        } else {
            Ok(self
                .snapshots
                .get(&user_id)
                .cloned()
                .unwrap_or_else(|| InventorySnapshot::accessible(vec![])))
        };
        Box::pin(async move { result })
    }
}

// ============================================================================
// Fixtures
// ============================================================================

fn catalog() -> Arc<ItemCatalog> {
    Arc::new(ItemCatalog::from_items([CatalogItem {
        defindex: CAP,
        name: "Ellis' Cap".to_string(),
    }]))
}

fn metal(id: u64, defindex: DefIndex) -> ItemInstance {
    ItemInstance::new(ItemId(id), defindex, Quality::Unique)
}

fn cap(id: u64) -> ItemInstance {
    ItemInstance::new(ItemId(id), CAP, Quality::Unique)
}

fn manager(
    book: OrderBook,
    snapshots: HashMap<u64, InventorySnapshot>,
) -> TradeManager {
    let book = Arc::new(RwLock::new(book));
    let handler = Arc::new(OrderHandler::new(catalog(), book));
    TradeManager::new(
        BOT_ID,
        TradeTimingConfig::default(),
        handler,
        Arc::new(FakeInventories {
            snapshots,
            fail: false,
        }),
    )
}

fn other_added(item: ItemInstance) -> TradeEvent {
    TradeEvent::ItemAdded {
        party: Party::Other,
        item,
    }
}

fn bot_added(item: ItemInstance) -> TradeEvent {
    TradeEvent::ItemAdded {
        party: Party::Bot,
        item,
    }
}

// ============================================================================
// Flows
// ============================================================================

#[tokio::test(start_paused = true)]
async fn sell_flow_completes() {
    let mut book = OrderBook::new();
    book.insert(Order::new(
        OrderSide::Sell,
        CAP,
        Quality::Unique,
        Currency::parse_ref("2.00").unwrap(),
    ))
    .unwrap();

    let snapshots = HashMap::from([
        (BOT_ID, InventorySnapshot::accessible(vec![cap(1)])),
        (
            OTHER_ID,
            InventorySnapshot::accessible(vec![
                metal(10, DefIndex::REFINED),
                metal(11, DefIndex::REFINED),
            ]),
        ),
    ]);

    let transport = FakeTransport::scripted(vec![
        vec![TradeEvent::Message("buy ellis' cap".to_string())],
        vec![
            bot_added(cap(1)),
            other_added(metal(10, DefIndex::REFINED)),
            other_added(metal(11, DefIndex::REFINED)),
        ],
        vec![TradeEvent::ReadyChanged {
            party: Party::Other,
            ready: true,
        }],
        vec![TradeEvent::AcceptSignaled {
            party: Party::Other,
        }],
        vec![TradeEvent::Closed(RemoteClose::Completed)],
    ]);

    let mgr = manager(book, snapshots);
    let handle = mgr
        .open_session(OTHER_ID, false, transport.clone())
        .await
        .unwrap();

    assert_eq!(handle.await.unwrap(), CloseReason::Success);
    assert_eq!(mgr.open_session_with(), None);

    let log = transport.log();
    assert!(log.contains(&Logged::Add(ItemId(1))));
    assert!(log.contains(&Logged::Ready(true)));
    assert!(log.contains(&Logged::Accept));
    assert!(log
        .iter()
        .any(|e| matches!(e, Logged::TradeMsg(m) if m.contains("correct amount"))));
}

#[tokio::test(start_paused = true)]
async fn buy_flow_auto_pays_and_completes() {
    let mut book = OrderBook::new();
    book.insert(Order::new(
        OrderSide::Buy,
        CAP,
        Quality::Unique,
        Currency::parse_ref("2.00").unwrap(),
    ))
    .unwrap();

    let snapshots = HashMap::from([
        (
            BOT_ID,
            InventorySnapshot::accessible(vec![
                metal(1, DefIndex::REFINED),
                metal(2, DefIndex::REFINED),
            ]),
        ),
        (OTHER_ID, InventorySnapshot::accessible(vec![cap(100)])),
    ]);

    let transport = FakeTransport::scripted(vec![
        vec![other_added(cap(100))],
        vec![
            bot_added(metal(1, DefIndex::REFINED)),
            bot_added(metal(2, DefIndex::REFINED)),
            TradeEvent::ReadyChanged {
                party: Party::Other,
                ready: true,
            },
        ],
        vec![TradeEvent::AcceptSignaled {
            party: Party::Other,
        }],
        vec![TradeEvent::Closed(RemoteClose::Completed)],
    ]);

    let mgr = manager(book, snapshots);
    let handle = mgr
        .open_session(OTHER_ID, false, transport.clone())
        .await
        .unwrap();

    assert_eq!(handle.await.unwrap(), CloseReason::Success);

    let log = transport.log();
    assert!(log.contains(&Logged::Add(ItemId(1))));
    assert!(log.contains(&Logged::Add(ItemId(2))));
    assert!(log.contains(&Logged::Ready(true)));
    assert!(log.contains(&Logged::Accept));
}

#[tokio::test(start_paused = true)]
async fn silence_times_out_with_warning() {
    let transport = FakeTransport::scripted(vec![]);
    let mgr = manager(OrderBook::new(), HashMap::new());
    let handle = mgr
        .open_session(OTHER_ID, false, transport.clone())
        .await
        .unwrap();

    assert_eq!(handle.await.unwrap(), CloseReason::TimedOut);

    let log = transport.log();
    assert!(log
        .iter()
        .any(|e| matches!(e, Logged::TradeMsg(m) if m.starts_with("Are you still there?"))));
    assert!(log.contains(&Logged::Cancel));
    assert!(log
        .iter()
        .any(|e| matches!(e, Logged::ChatMsg(m) if m.contains("AFK"))));
}

#[tokio::test(start_paused = true)]
async fn repeated_poll_failures_abandon_the_trade() {
    let transport = FakeTransport::failing();
    let mgr = manager(OrderBook::new(), HashMap::new());
    let handle = mgr
        .open_session(OTHER_ID, false, transport)
        .await
        .unwrap();

    assert!(matches!(handle.await.unwrap(), CloseReason::Error(_)));
}

#[tokio::test(start_paused = true)]
async fn only_one_session_at_a_time() {
    let transport = FakeTransport::scripted(vec![]);
    let mgr = manager(OrderBook::new(), HashMap::new());
    let handle = mgr
        .open_session(OTHER_ID, false, transport.clone())
        .await
        .unwrap();

    // Second request refused while the first is open.
    let second = FakeTransport::scripted(vec![]);
    match mgr.open_session(42, false, second).await {
        Err(TradeError::SessionAlreadyOpen { other_id }) => assert_eq!(other_id, OTHER_ID),
        other => panic!("expected SessionAlreadyOpen, got {other:?}"),
    }

    mgr.cancel_open_session();
    assert_eq!(handle.await.unwrap(), CloseReason::Cancelled);
    assert_eq!(mgr.open_session_with(), None);

    // The slot is free again.
    let third = FakeTransport::scripted(vec![vec![TradeEvent::Closed(RemoteClose::Cancelled)]]);
    let handle = mgr.open_session(42, false, third).await.unwrap();
    assert_eq!(handle.await.unwrap(), CloseReason::Cancelled);
}

#[tokio::test]
async fn inventory_fetch_failure_creates_no_session() {
    let book = Arc::new(RwLock::new(OrderBook::new()));
    let handler = Arc::new(OrderHandler::new(catalog(), book));
    let mgr = TradeManager::new(
        BOT_ID,
        TradeTimingConfig::default(),
        handler,
        Arc::new(FakeInventories {
            snapshots: HashMap::new(),
            fail: true,
        }),
    );

    let transport = FakeTransport::scripted(vec![]);
    match mgr.open_session(OTHER_ID, false, transport).await {
        Err(TradeError::InventoryInit(_)) => {}
        other => panic!("expected InventoryInit, got {other:?}"),
    }
    assert_eq!(mgr.open_session_with(), None);
}

//! The trading state store — the single source of truth for session state.
//!
//! Snapshot fetches and stream messages both land here, and presentation
//! logic reads only from here. All mutations go through one `RwLock`, so
//! concurrent stream pushes and user-initiated reconciliations serialize
//! cleanly and every read observes a complete entity. No lock is ever held
//! across an await on network I/O — callers finish their network work first
//! and then apply the result.

use crate::domain::market::Market;
use crate::domain::order::Order;
use crate::domain::orderbook::{BookLevel, BookSnapshot, BookState};
use crate::domain::trade::{Trade, TradeTape};
use crate::shared::{MarketId, OrderId};

use async_lock::RwLock;
use std::collections::{HashMap, HashSet};

/// Default bound on the trade tape.
pub const DEFAULT_TRADE_CAP: usize = 100;

struct StoreInner {
    market: Option<Market>,
    book: BookState,
    trades: TradeTape,
    /// Open orders, in insertion order. Upserts preserve position.
    open_orders: Vec<Order>,
    /// Every order seen this session, including filled/cancelled ones.
    history: HashMap<OrderId, Order>,
    connected: bool,
    subscribed: HashSet<MarketId>,
}

/// Session-scoped trading state. Constructed explicitly at session start and
/// dropped at session end; shared by `Arc`, never global.
pub struct TradingStore {
    inner: RwLock<StoreInner>,
}

impl TradingStore {
    pub fn new() -> Self {
        Self::with_trade_cap(DEFAULT_TRADE_CAP)
    }

    pub fn with_trade_cap(trade_cap: usize) -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                market: None,
                book: BookState::new(),
                trades: TradeTape::new(trade_cap),
                open_orders: Vec::new(),
                history: HashMap::new(),
                connected: false,
                subscribed: HashSet::new(),
            }),
        }
    }

    // ── Mutations ────────────────────────────────────────────────────────

    /// Wholesale market replace. Clears the book when the market changes,
    /// since depth from another market is meaningless.
    pub async fn set_market(&self, market: Market) {
        let mut inner = self.inner.write().await;
        let changed = inner
            .market
            .as_ref()
            .map(|m| m.id != market.id)
            .unwrap_or(true);
        if changed {
            inner.book.clear();
        }
        inner.market = Some(market);
    }

    /// Authoritative book replace. A snapshot re-delivered after reconnect
    /// overwrites prior state, which makes re-delivery idempotent.
    pub async fn set_book_snapshot(&self, snapshot: &BookSnapshot) {
        let mut inner = self.inner.write().await;
        inner.book.apply_snapshot(snapshot);
    }

    /// Apply a book delta. No-op until a snapshot exists. Deltas arrive
    /// pre-sorted per side from the matcher; ordering is enforced here by
    /// the price-keyed book state regardless.
    pub async fn apply_book_delta(&self, bids: &[BookLevel], asks: &[BookLevel]) {
        let mut inner = self.inner.write().await;
        inner.book.apply_delta(bids, asks);
    }

    /// Prepend a trade to the tape (bounded window) and advance last price.
    pub async fn add_trade(&self, trade: Trade) {
        let mut inner = self.inner.write().await;
        inner.book.set_last_price(trade.price);
        inner.trades.push(trade);
    }

    /// Replace the trade tape from a snapshot fetch (newest first).
    pub async fn set_trades(&self, trades: Vec<Trade>) {
        let mut inner = self.inner.write().await;
        inner.trades.replace(trades);
    }

    /// Replace the full open-order set, e.g. after a user-orders fetch.
    /// Every order also lands in the session history.
    pub async fn set_open_orders(&self, orders: Vec<Order>) {
        let mut inner = self.inner.write().await;
        for order in &orders {
            inner.history.insert(order.order_id, order.clone());
        }
        inner.open_orders = orders.into_iter().filter(|o| o.is_open()).collect();
    }

    /// Insert or update one order. This is the path stream pushes and
    /// coordinator reconciliations use; applying the same update twice
    /// leaves the store unchanged beyond the first application.
    ///
    /// Orders whose status reaches filled/cancelled leave the open view but
    /// remain in the session history.
    pub async fn upsert_order(&self, order: Order) {
        let mut inner = self.inner.write().await;
        inner.history.insert(order.order_id, order.clone());

        let existing = inner
            .open_orders
            .iter()
            .position(|o| o.order_id == order.order_id);
        match (existing, order.is_open()) {
            (Some(idx), true) => inner.open_orders[idx] = order,
            (Some(idx), false) => {
                inner.open_orders.remove(idx);
            }
            (None, true) => inner.open_orders.push(order),
            (None, false) => {}
        }
    }

    pub async fn set_connected(&self, connected: bool) {
        self.inner.write().await.connected = connected;
    }

    pub async fn set_subscribed(&self, market_id: MarketId, subscribed: bool) {
        let mut inner = self.inner.write().await;
        if subscribed {
            inner.subscribed.insert(market_id);
        } else {
            inner.subscribed.remove(&market_id);
        }
    }

    // ── Read projections ─────────────────────────────────────────────────

    pub async fn market(&self) -> Option<Market> {
        self.inner.read().await.market.clone()
    }

    /// Ordered book snapshot, or `None` before the first stream/REST snapshot.
    pub async fn book(&self) -> Option<BookSnapshot> {
        self.inner.read().await.book.snapshot()
    }

    pub async fn trades(&self) -> Vec<Trade> {
        self.inner.read().await.trades.trades().iter().cloned().collect()
    }

    pub async fn open_orders(&self) -> Vec<Order> {
        self.inner.read().await.open_orders.clone()
    }

    /// Look an order up in the session history, open or not.
    pub async fn order(&self, order_id: OrderId) -> Option<Order> {
        self.inner.read().await.history.get(&order_id).cloned()
    }

    pub async fn is_connected(&self) -> bool {
        self.inner.read().await.connected
    }

    pub async fn subscribed_markets(&self) -> HashSet<MarketId> {
        self.inner.read().await.subscribed.clone()
    }
}

impl Default for TradingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderStatus;
    use crate::shared::{Side, WalletStr};
    use chrono::Utc;

    fn level(price: u64, size: u64) -> BookLevel {
        BookLevel { price, size, order_count: 1 }
    }

    fn snapshot(bids: Vec<BookLevel>, asks: Vec<BookLevel>) -> BookSnapshot {
        BookSnapshot {
            market_id: MarketId::from("m1"),
            bids,
            asks,
            last_price: None,
            timestamp: Utc::now(),
        }
    }

    fn order(id: u128, status: OrderStatus, filled: u64) -> Order {
        Order {
            order_id: OrderId::new(id),
            user_wallet: WalletStr::from("wallet"),
            market_id: MarketId::from("m1"),
            side: Side::Buy,
            price: 1_000_000_000,
            size: 1_000_000_000,
            filled,
            status,
            settlement_signature: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn trade(id: i64) -> Trade {
        Trade {
            id,
            market_id: MarketId::from("m1"),
            maker_order_id: OrderId::new(1),
            taker_order_id: OrderId::new(2),
            maker_wallet: WalletStr::from("maker"),
            taker_wallet: WalletStr::from("taker"),
            price: 100 + id as u64,
            size: 10,
            maker_fee: 0,
            taker_fee: 0,
            settlement_signature: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_delta_without_snapshot_is_noop() {
        let store = TradingStore::new();
        store.apply_book_delta(&[level(100, 5)], &[]).await;
        assert!(store.book().await.is_none());
    }

    #[tokio::test]
    async fn test_book_invariants_after_snapshot_and_deltas() {
        let store = TradingStore::new();
        store
            .set_book_snapshot(&snapshot(
                vec![level(105, 1), level(100, 1)],
                vec![level(110, 1)],
            ))
            .await;
        store
            .apply_book_delta(&[level(103, 4), level(105, 0)], &[level(108, 2)])
            .await;

        let book = store.book().await.unwrap();
        let bid_prices: Vec<u64> = book.bids.iter().map(|l| l.price).collect();
        let ask_prices: Vec<u64> = book.asks.iter().map(|l| l.price).collect();
        assert_eq!(bid_prices, vec![103, 100]);
        assert_eq!(ask_prices, vec![108, 110]);
        assert!(bid_prices.windows(2).all(|w| w[0] > w[1]));
        assert!(ask_prices.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_trade_cap_keeps_most_recent_newest_first() {
        let store = TradingStore::new();
        for i in 0..150 {
            store.add_trade(trade(i)).await;
        }
        let trades = store.trades().await;
        assert_eq!(trades.len(), 100);
        assert_eq!(trades[0].id, 149);
        assert_eq!(trades[99].id, 50);
    }

    #[tokio::test]
    async fn test_upsert_order_idempotent() {
        let store = TradingStore::new();
        let update = order(7, OrderStatus::PartiallyFilled, 300);
        store.upsert_order(update.clone()).await;
        let once = store.open_orders().await;
        store.upsert_order(update).await;
        let twice = store.open_orders().await;
        assert_eq!(once, twice);
        assert_eq!(twice.len(), 1);
        assert_eq!(twice[0].filled, 300);
    }

    #[tokio::test]
    async fn test_upsert_preserves_position() {
        let store = TradingStore::new();
        store.upsert_order(order(1, OrderStatus::Pending, 0)).await;
        store.upsert_order(order(2, OrderStatus::Pending, 0)).await;
        store.upsert_order(order(1, OrderStatus::PartiallyFilled, 5)).await;
        let open = store.open_orders().await;
        assert_eq!(open[0].order_id, OrderId::new(1));
        assert_eq!(open[0].filled, 5);
        assert_eq!(open[1].order_id, OrderId::new(2));
    }

    #[tokio::test]
    async fn test_filled_order_leaves_open_view_but_stays_in_history() {
        let store = TradingStore::new();
        store.upsert_order(order(1, OrderStatus::Pending, 0)).await;
        store
            .upsert_order(order(1, OrderStatus::Filled, 1_000_000_000))
            .await;
        assert!(store.open_orders().await.is_empty());
        let hist = store.order(OrderId::new(1)).await.unwrap();
        assert_eq!(hist.status, OrderStatus::Filled);
    }

    #[tokio::test]
    async fn test_set_open_orders_filters_terminal_statuses() {
        let store = TradingStore::new();
        store
            .set_open_orders(vec![
                order(1, OrderStatus::Pending, 0),
                order(2, OrderStatus::Cancelled, 0),
            ])
            .await;
        let open = store.open_orders().await;
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].order_id, OrderId::new(1));
        assert!(store.order(OrderId::new(2)).await.is_some());
    }

    #[tokio::test]
    async fn test_market_change_clears_book() {
        let store = TradingStore::new();
        let mut m = Market {
            id: MarketId::from("m1"),
            base_mint: WalletStr::from("base"),
            quote_mint: WalletStr::from("quote"),
            base_decimals: 9,
            quote_decimals: 6,
            min_order_size: 1,
            tick_size: 1,
            maker_fee_bps: 0,
            taker_fee_bps: 0,
            is_active: true,
            created_at: Utc::now(),
        };
        store.set_market(m.clone()).await;
        store
            .set_book_snapshot(&snapshot(vec![level(100, 1)], vec![]))
            .await;
        assert!(store.book().await.is_some());

        m.id = MarketId::from("m2");
        store.set_market(m).await;
        assert!(store.book().await.is_none());
    }
}

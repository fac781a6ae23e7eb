//! Event dispatch — applies stream events to the trading store.

use crate::store::TradingStore;
use crate::ws::client::WsClient;
use crate::ws::{MessageIn, WsEvent};

use futures_util::StreamExt;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Apply one stream event to the store.
///
/// Malformed or unknown frames have already been turned into
/// [`WsEvent::Error`] by the client; they are logged and dropped, never
/// applied. Returns `false` once the stream is terminally offline.
pub async fn apply_event(store: &TradingStore, event: WsEvent) -> bool {
    match event {
        WsEvent::Message(msg) => match msg {
            MessageIn::OrderbookSnapshot(snapshot) => {
                store.set_book_snapshot(&snapshot).await;
            }
            MessageIn::OrderbookUpdate(update) => {
                store.apply_book_delta(&update.bids, &update.asks).await;
            }
            MessageIn::Trade(trade) => {
                store.add_trade(trade).await;
            }
            MessageIn::OrderUpdate(order) => {
                store.upsert_order(order).await;
            }
            MessageIn::Error { message } => {
                tracing::warn!("matcher stream error: {}", message);
            }
        },
        WsEvent::Connected => {
            store.set_connected(true).await;
        }
        WsEvent::Disconnected { code, reason } => {
            tracing::info!(?code, reason, "stream disconnected");
            store.set_connected(false).await;
        }
        WsEvent::Offline => {
            tracing::error!("stream offline: reconnect attempts exhausted");
            store.set_connected(false).await;
            return false;
        }
        WsEvent::Error(e) => {
            tracing::warn!("stream error: {}", e);
        }
    }
    true
}

/// Spawn the dispatcher task. Takes ownership of the connected client and
/// drains its events into the store until the stream goes terminally
/// offline. Use a [`super::WsController`] taken beforehand to drive the
/// connection from outside.
pub fn spawn_dispatcher(client: WsClient, store: Arc<TradingStore>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut events = client.events();
        while let Some(event) = events.next().await {
            if !apply_event(&store, event).await {
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{Order, OrderStatus};
    use crate::domain::orderbook::{BookLevel, BookSnapshot};
    use crate::shared::{MarketId, OrderId, Side, WalletStr};
    use crate::ws::BookUpdate;
    use chrono::Utc;

    fn snapshot_event() -> WsEvent {
        WsEvent::Message(MessageIn::OrderbookSnapshot(BookSnapshot {
            market_id: MarketId::from("m1"),
            bids: vec![BookLevel { price: 100, size: 5, order_count: 1 }],
            asks: vec![BookLevel { price: 110, size: 3, order_count: 1 }],
            last_price: Some(105),
            timestamp: Utc::now(),
        }))
    }

    #[tokio::test]
    async fn test_snapshot_then_update_applied() {
        let store = TradingStore::new();
        assert!(apply_event(&store, snapshot_event()).await);
        assert!(
            apply_event(
                &store,
                WsEvent::Message(MessageIn::OrderbookUpdate(BookUpdate {
                    market_id: MarketId::from("m1"),
                    bids: vec![BookLevel { price: 100, size: 0, order_count: 0 }],
                    asks: vec![],
                }))
            )
            .await
        );

        let book = store.book().await.unwrap();
        assert!(book.bids.is_empty());
        assert_eq!(book.asks.len(), 1);
    }

    #[tokio::test]
    async fn test_order_update_applied() {
        let store = TradingStore::new();
        let order = Order {
            order_id: OrderId::new(9),
            user_wallet: WalletStr::from("w"),
            market_id: MarketId::from("m1"),
            side: Side::Sell,
            price: 100,
            size: 10,
            filled: 0,
            status: OrderStatus::Pending,
            settlement_signature: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        apply_event(&store, WsEvent::Message(MessageIn::OrderUpdate(order))).await;
        assert_eq!(store.open_orders().await.len(), 1);
    }

    #[tokio::test]
    async fn test_connection_events_toggle_flag() {
        let store = TradingStore::new();
        apply_event(&store, WsEvent::Connected).await;
        assert!(store.is_connected().await);
        apply_event(
            &store,
            WsEvent::Disconnected { code: None, reason: "eof".into() },
        )
        .await;
        assert!(!store.is_connected().await);
    }

    #[tokio::test]
    async fn test_offline_is_terminal() {
        let store = TradingStore::new();
        apply_event(&store, WsEvent::Connected).await;
        assert!(!apply_event(&store, WsEvent::Offline).await);
        assert!(!store.is_connected().await);
    }
}

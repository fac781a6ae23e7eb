//! WebSocket layer — matcher stream protocol and client.
//!
//! Wire format is JSON with a `type` discriminator and a `data` payload.
//! The client owns a background tokio task that handles reconnection with
//! exponential backoff, resubscription, and queueing of messages sent while
//! disconnected.

pub mod client;
pub mod dispatch;

pub use client::{WsClient, WsController};
pub use dispatch::spawn_dispatcher;

use crate::domain::order::Order;
use crate::domain::orderbook::{BookLevel, BookSnapshot};
use crate::domain::trade::Trade;
use crate::shared::MarketId;
use serde::{Deserialize, Serialize};

/// Client → matcher messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum MessageOut {
    Subscribe { market_id: MarketId },
    Unsubscribe { market_id: MarketId },
}

/// Incremental book update for one market. Levels replace the level at
/// their price; size 0 removes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookUpdate {
    pub market_id: MarketId,
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
}

/// Matcher → client messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum MessageIn {
    OrderbookSnapshot(BookSnapshot),
    OrderbookUpdate(BookUpdate),
    Trade(Trade),
    OrderUpdate(Order),
    Error { message: String },
}

/// Events delivered to the consumer of [`WsClient::events`].
#[derive(Debug, Clone, PartialEq)]
pub enum WsEvent {
    /// A parsed message from the matcher.
    Message(MessageIn),
    /// Connection established (initial or after reconnect).
    Connected,
    /// Connection lost. The client keeps reconnecting unless this was a
    /// requested close.
    Disconnected { code: Option<u16>, reason: String },
    /// Reconnect attempts exhausted. Terminal: the task has exited and the
    /// session must be restarted explicitly.
    Offline,
    /// Non-fatal protocol error (e.g. an unparseable frame).
    Error(String),
}

/// Connection state, mirrored from the background task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ReadyState {
    Connecting = 0,
    Open = 1,
    Closing = 2,
    Closed = 3,
}

impl From<u16> for ReadyState {
    fn from(v: u16) -> Self {
        match v {
            0 => ReadyState::Connecting,
            1 => ReadyState::Open,
            2 => ReadyState::Closing,
            _ => ReadyState::Closed,
        }
    }
}

/// WebSocket client configuration.
#[derive(Debug, Clone)]
pub struct WsConfig {
    pub url: String,
    /// Reconnect automatically on unexpected disconnects.
    pub reconnect: bool,
    /// Base delay for the first reconnect attempt; doubles each attempt.
    pub base_reconnect_delay_ms: u32,
    /// Cap on the reconnect delay.
    pub max_reconnect_delay_ms: u32,
    /// Attempts before giving up and emitting [`WsEvent::Offline`].
    pub max_reconnect_attempts: u32,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            url: crate::network::DEFAULT_WS_URL.to_string(),
            reconnect: true,
            base_reconnect_delay_ms: 1_000,
            max_reconnect_delay_ms: 30_000,
            max_reconnect_attempts: 5,
        }
    }
}

//! Orderbook domain — depth levels and the live book state container.

pub mod state;

use crate::shared::MarketId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use state::BookState;

/// One aggregated price level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookLevel {
    pub price: u64,
    pub size: u64,
    pub order_count: u32,
}

/// A full depth snapshot as the matcher sends it.
///
/// Bids are ordered by price descending, asks ascending; no duplicate price
/// per side. `timestamp` is the matcher's version marker and only ever
/// advances.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookSnapshot {
    pub market_id: MarketId,
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
    pub last_price: Option<u64>,
    pub timestamp: DateTime<Utc>,
}

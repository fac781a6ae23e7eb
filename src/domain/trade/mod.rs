//! Trade domain — executed-trade records and the rolling tape.

pub mod state;

use crate::shared::{MarketId, OrderId, WalletStr};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use state::TradeTape;

/// One executed trade as the matcher reports it. Immutable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trade {
    pub id: i64,
    pub market_id: MarketId,
    pub maker_order_id: OrderId,
    pub taker_order_id: OrderId,
    pub maker_wallet: WalletStr,
    pub taker_wallet: WalletStr,
    pub price: u64,
    pub size: u64,
    pub maker_fee: u64,
    pub taker_fee: u64,
    pub settlement_signature: Option<String>,
    pub created_at: DateTime<Utc>,
}

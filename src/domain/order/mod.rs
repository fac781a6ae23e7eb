//! Order domain — the order record and the matcher's order wire requests.

use crate::shared::{MarketId, OrderId, Side, WalletStr};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Order status as the matcher reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    PartiallyFilled,
    Filled,
    Cancelled,
}

/// One order, as held in the store and on the wire.
///
/// Created client-side the instant ledger confirmation succeeds; afterwards
/// mutated only by matcher responses and stream pushes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub order_id: OrderId,
    pub user_wallet: WalletStr,
    pub market_id: MarketId,
    pub side: Side,
    pub price: u64,
    pub size: u64,
    pub filled: u64,
    pub status: OrderStatus,
    pub settlement_signature: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn remaining(&self) -> u64 {
        self.size.saturating_sub(self.filled)
    }

    /// Whether the order still belongs in the open-orders view.
    pub fn is_open(&self) -> bool {
        matches!(self.status, OrderStatus::Pending | OrderStatus::PartiallyFilled)
    }
}

// ─── Matcher order endpoints: request/response bodies ────────────────────────

/// Body for the matcher's place-order endpoint. The settlement signature
/// proves the on-chain escrow already exists; the order id is the
/// client-generated one used for the on-chain order account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaceOrderRequest {
    pub market_id: MarketId,
    pub side: Side,
    pub price: u64,
    pub size: u64,
    pub wallet: WalletStr,
    pub settlement_signature: String,
    pub order_id: OrderId,
}

/// An immediate fill reported in the place-order response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FillInfo {
    pub maker_order_id: OrderId,
    pub price: u64,
    pub size: u64,
}

/// Response from the matcher's place-order endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaceOrderResponse {
    pub order: Order,
    pub trades: Vec<FillInfo>,
}

//! Market domain — per-session immutable market descriptors.

use crate::shared::{MarketId, WalletStr};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An asset-pair market as the matcher describes it.
///
/// Immutable per session: created on snapshot fetch, replaced wholesale on
/// refetch, never partially mutated. All sizes and prices are integers in
/// the smallest unit of the respective asset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Market {
    pub id: MarketId,
    pub base_mint: WalletStr,
    pub quote_mint: WalletStr,
    pub base_decimals: u8,
    pub quote_decimals: u8,
    pub min_order_size: u64,
    pub tick_size: u64,
    pub maker_fee_bps: u16,
    pub taker_fee_bps: u16,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Market {
    /// Whether a size meets the market minimum.
    pub fn validate_order_size(&self, size: u64) -> bool {
        size >= self.min_order_size
    }

    /// Whether a price is aligned to the tick grid.
    pub fn validate_price(&self, price: u64) -> bool {
        self.tick_size > 0 && price % self.tick_size == 0
    }
}

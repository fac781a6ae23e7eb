//! Live orderbook state — applies snapshots and deltas.

use super::{BookLevel, BookSnapshot};
use crate::shared::MarketId;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Live book state for one market.
///
/// Holds both sides as price-keyed maps, so ordering and per-side price
/// uniqueness hold by construction after any sequence of snapshot and delta
/// applications. A delta replaces the level at its price; size 0 removes it.
/// Deltas are ignored until a snapshot has been seen, to avoid materializing
/// a book from partial data.
#[derive(Debug, Clone, Default)]
pub struct BookState {
    market_id: MarketId,
    // size and order count, keyed by price
    bids: BTreeMap<u64, (u64, u32)>,
    asks: BTreeMap<u64, (u64, u32)>,
    last_price: Option<u64>,
    timestamp: Option<DateTime<Utc>>,
    has_snapshot: bool,
}

impl BookState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole book from a snapshot. Authoritative: a re-delivered
    /// snapshot after reconnect simply overwrites prior state.
    pub fn apply_snapshot(&mut self, snap: &BookSnapshot) {
        self.market_id = snap.market_id.clone();
        self.bids.clear();
        self.asks.clear();
        for level in &snap.bids {
            if level.size > 0 {
                self.bids.insert(level.price, (level.size, level.order_count));
            }
        }
        for level in &snap.asks {
            if level.size > 0 {
                self.asks.insert(level.price, (level.size, level.order_count));
            }
        }
        self.last_price = snap.last_price;
        self.timestamp = Some(snap.timestamp);
        self.has_snapshot = true;
    }

    /// Apply an incremental update. No-op if no snapshot has been applied.
    pub fn apply_delta(&mut self, bids: &[BookLevel], asks: &[BookLevel]) {
        if !self.has_snapshot {
            tracing::debug!("dropping book delta before first snapshot");
            return;
        }
        for level in bids {
            if level.size == 0 {
                self.bids.remove(&level.price);
            } else {
                self.bids.insert(level.price, (level.size, level.order_count));
            }
        }
        for level in asks {
            if level.size == 0 {
                self.asks.remove(&level.price);
            } else {
                self.asks.insert(level.price, (level.size, level.order_count));
            }
        }
        self.timestamp = Some(Utc::now());
    }

    pub fn set_last_price(&mut self, price: u64) {
        self.last_price = Some(price);
    }

    /// Whether a snapshot has been applied yet.
    pub fn is_ready(&self) -> bool {
        self.has_snapshot
    }

    /// Highest bid price.
    pub fn best_bid(&self) -> Option<u64> {
        self.bids.keys().next_back().copied()
    }

    /// Lowest ask price.
    pub fn best_ask(&self) -> Option<u64> {
        self.asks.keys().next().copied()
    }

    pub fn spread(&self) -> Option<u64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask.saturating_sub(bid)),
            _ => None,
        }
    }

    /// Materialize the current state into an ordered snapshot: bids by price
    /// descending, asks ascending.
    pub fn snapshot(&self) -> Option<BookSnapshot> {
        if !self.has_snapshot {
            return None;
        }
        Some(BookSnapshot {
            market_id: self.market_id.clone(),
            bids: self
                .bids
                .iter()
                .rev()
                .map(|(&price, &(size, order_count))| BookLevel { price, size, order_count })
                .collect(),
            asks: self
                .asks
                .iter()
                .map(|(&price, &(size, order_count))| BookLevel { price, size, order_count })
                .collect(),
            last_price: self.last_price,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
        })
    }

    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
        self.last_price = None;
        self.timestamp = None;
        self.has_snapshot = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn test_delta_before_snapshot_is_noop() {
        let mut book = BookState::new();
        book.apply_delta(&[level(100, 5)], &[]);
        assert!(!book.is_ready());
        assert_eq!(book.best_bid(), None);
    }

    #[test]
    fn test_snapshot_replaces_state() {
        let mut book = BookState::new();
        book.apply_snapshot(&snapshot(vec![level(100, 5)], vec![level(110, 3)]));
        assert_eq!(book.best_bid(), Some(100));
        assert_eq!(book.best_ask(), Some(110));

        book.apply_snapshot(&snapshot(vec![level(90, 2)], vec![level(95, 1)]));
        assert_eq!(book.best_bid(), Some(90));
        assert_eq!(book.best_ask(), Some(95));
        assert_eq!(book.snapshot().unwrap().bids.len(), 1);
    }

    #[test]
    fn test_delta_replaces_and_removes_levels() {
        let mut book = BookState::new();
        book.apply_snapshot(&snapshot(
            vec![level(100, 5), level(99, 2)],
            vec![level(110, 3)],
        ));
        book.apply_delta(&[level(100, 7), level(99, 0)], &[level(111, 4)]);

        let snap = book.snapshot().unwrap();
        assert_eq!(snap.bids, vec![level(100, 7)]);
        assert_eq!(snap.asks, vec![level(110, 3), level(111, 4)]);
    }

    #[test]
    fn test_ordering_invariant_after_mixed_updates() {
        let mut book = BookState::new();
        book.apply_snapshot(&snapshot(
            vec![level(105, 1), level(100, 1)],
            vec![level(110, 1), level(120, 1)],
        ));
        book.apply_delta(
            &[level(103, 2), level(101, 2), level(105, 0)],
            &[level(115, 2), level(110, 0)],
        );

        let snap = book.snapshot().unwrap();
        let bid_prices: Vec<u64> = snap.bids.iter().map(|l| l.price).collect();
        let ask_prices: Vec<u64> = snap.asks.iter().map(|l| l.price).collect();
        assert!(bid_prices.windows(2).all(|w| w[0] > w[1]));
        assert!(ask_prices.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(bid_prices, vec![103, 101, 100]);
        assert_eq!(ask_prices, vec![115, 120]);
    }

    #[test]
    fn test_spread() {
        let mut book = BookState::new();
        book.apply_snapshot(&snapshot(vec![level(100, 1)], vec![level(107, 1)]));
        assert_eq!(book.spread(), Some(7));
    }

    #[test]
    fn test_clear_resets_snapshot_gate() {
        let mut book = BookState::new();
        book.apply_snapshot(&snapshot(vec![level(100, 1)], vec![]));
        book.clear();
        assert!(!book.is_ready());
        book.apply_delta(&[level(100, 5)], &[]);
        assert_eq!(book.best_bid(), None);
    }
}

//! # dcex SDK
//!
//! A Rust client SDK for the dcex hybrid exchange: order matching happens on
//! an off-chain service while fund custody and order existence are settled by
//! an on-chain program with its own confirmation latency.
//!
//! ## Architecture
//!
//! The SDK is organized in layers:
//!
//! 1. **Core** — Shared newtypes, domain models, on-chain program bindings
//! 2. **HTTP API** — `MatcherHttp` with per-endpoint retry policies
//! 3. **WebSocket** — `WsClient` with reconnect/resubscribe plus a dispatcher
//!    that folds stream messages into the store
//! 4. **Store** — `TradingStore`, the single serialized-writer state holder
//! 5. **Ledger** — the `Ledger` submission seam (`SolanaLedger` behind the
//!    `solana-rpc` feature)
//! 6. **Coordinator** — `OrderCoordinator`, the two-phase place/cancel state
//!    machine, and `TradingSession` tying everything together
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dcex_sdk::prelude::*;
//!
//! let session = TradingSession::builder()
//!     .base_url("http://localhost:3001")
//!     .wallet(WalletStr::new("7BgBvyjrZX1YKz4oh9mjb8ZScatkkwb8DzFx7LoiVkM3"))
//!     .ledger(ledger)
//!     .build()?;
//!
//! session.start(&market_id).await?;
//! let placed = session.coordinator().place(intent).await?;
//! ```

// ── Layer 1: Core ────────────────────────────────────────────────────────────

/// Shared newtypes used across all domains.
pub mod shared;

/// Domain modules: market, orderbook, trade, order types and state containers.
pub mod domain;

/// On-chain program interaction: instructions, PDAs, vault account layout.
pub mod program;

/// Unified SDK error types.
pub mod error;

/// Network URL constants.
pub mod network;

// ── Layer 2: HTTP API ────────────────────────────────────────────────────────

/// HTTP client for the matcher REST API, with retry policies.
pub mod http;

// ── Layer 3: WebSocket ───────────────────────────────────────────────────────

/// WebSocket stream client: messages, reconnection, store dispatch.
pub mod ws;

// ── Layer 4: Store ───────────────────────────────────────────────────────────

/// The trading state store — single source of truth for session state.
pub mod store;

// ── Layer 5: Ledger ──────────────────────────────────────────────────────────

/// Settlement-ledger submission: the `Ledger` seam and its Solana impl.
pub mod ledger;

// ── Layer 6: Coordinator + Session ───────────────────────────────────────────

/// Order lifecycle coordination — the two-phase place/cancel protocol.
pub mod lifecycle;

/// `TradingSession` — the primary entry point.
pub mod session;

// ── Prelude ──────────────────────────────────────────────────────────────────

pub mod prelude {
    pub use crate::shared::{MarketId, OrderId, Side, WalletStr};

    pub use crate::domain::market::Market;
    pub use crate::domain::order::{
        FillInfo, Order, OrderStatus, PlaceOrderRequest, PlaceOrderResponse,
    };
    pub use crate::domain::orderbook::{BookLevel, BookSnapshot};
    pub use crate::domain::trade::Trade;

    pub use crate::error::{HttpError, LedgerError, SdkError, WsError};

    pub use crate::http::{MatcherHttp, RetryConfig, RetryPolicy};

    pub use crate::ledger::{Ledger, VaultBalance};

    pub use crate::lifecycle::{
        CoordinatorConfig, OrderCoordinator, OrphanedSettlement, PlaceIntent, Placed,
    };

    pub use crate::network::{DEFAULT_API_URL, DEFAULT_WS_URL};

    pub use crate::session::{TradingSession, TradingSessionBuilder};

    pub use crate::store::TradingStore;

    pub use crate::ws::{MessageIn, MessageOut, ReadyState, WsConfig, WsEvent};
}

//! Unified SDK error types.
//!
//! The taxonomy distinguishes *where* a failure leaves external state:
//! validation failures have no side effects, ledger rejections mean the
//! chain was never mutated, and [`SdkError::OrphanedSettlement`] means the
//! chain reflects an action the matcher has not registered — the one case
//! that requires explicit caller recovery.

use crate::shared::OrderId;
use thiserror::Error;

/// Top-level SDK error.
#[derive(Error, Debug)]
pub enum SdkError {
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("WebSocket error: {0}")]
    Ws(#[from] WsError),

    #[error("Ledger rejected: {0}")]
    Ledger(#[from] LedgerError),

    /// Local validation failure — no side effects, user-correctable.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The ledger confirmed the action but matcher registration failed or
    /// timed out. Carries everything needed to retry registration or submit
    /// a compensating on-chain cancel. Never swallow this variant.
    #[error("Orphaned settlement: order {order_id} confirmed as {settlement_signature} but not registered with the matcher")]
    OrphanedSettlement {
        order_id: OrderId,
        settlement_signature: String,
    },

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// HTTP-layer errors from the matcher REST API.
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Server error {status}: {body}")]
    ServerError { status: u16, body: String },

    #[error("Rate limited")]
    RateLimited,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Timeout")]
    Timeout,

    #[error("Max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },
}

/// WebSocket errors.
#[derive(Error, Debug)]
pub enum WsError {
    #[error("Not connected")]
    NotConnected,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Connection closed: code={code:?} reason={reason}")]
    Closed { code: Option<u16>, reason: String },
}

/// Settlement-ledger submission errors. All of these mean the on-chain
/// action never took effect — there is nothing to reconcile.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Insufficient vault balance")]
    InsufficientFunds,

    #[error("Order rejected by program: {0}")]
    InvalidOrder(String),

    #[error("Blockhash expired before confirmation")]
    BlockhashExpired,

    #[error("User declined to sign")]
    SigningDeclined,

    #[error("Invalid account address: {0}")]
    InvalidAddress(String),

    #[error("RPC error: {0}")]
    Rpc(String),
}

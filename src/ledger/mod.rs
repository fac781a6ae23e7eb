//! Settlement ledger layer.
//!
//! [`Ledger`] is the seam between the lifecycle coordinator and whatever
//! signs and submits transactions: an RPC client with a local keypair (the
//! [`solana::SolanaLedger`] adapter, behind the `solana-rpc` feature), a
//! wallet bridge, or a fake in tests. Every method resolves only once the
//! transaction is confirmed or definitively rejected.

#[cfg(feature = "solana-rpc")]
pub mod solana;

use crate::domain::market::Market;
use crate::error::LedgerError;
use crate::shared::{OrderId, Side};
use async_trait::async_trait;

pub use crate::program::vault::VaultBalance;

/// Signature of a confirmed settlement transaction.
pub type Signature = String;

#[async_trait]
pub trait Ledger: Send + Sync {
    /// Submit a place-order instruction and wait for confirmation.
    async fn submit_place(
        &self,
        market: &Market,
        order_id: OrderId,
        side: Side,
        price: u64,
        size: u64,
    ) -> Result<Signature, LedgerError>;

    /// Submit a cancel-order instruction and wait for confirmation.
    async fn submit_cancel(&self, market: &Market, order_id: OrderId)
        -> Result<Signature, LedgerError>;

    /// Deposit into the per-market vault.
    async fn submit_deposit(
        &self,
        market: &Market,
        amount: u64,
        is_base: bool,
    ) -> Result<Signature, LedgerError>;

    /// Withdraw unlocked balance from the per-market vault.
    async fn submit_withdraw(
        &self,
        market: &Market,
        amount: u64,
        is_base: bool,
    ) -> Result<Signature, LedgerError>;

    /// Current vault balances for this signer, or `None` if the vault
    /// account does not exist yet.
    async fn vault_balance(&self, market: &Market) -> Result<Option<VaultBalance>, LedgerError>;
}

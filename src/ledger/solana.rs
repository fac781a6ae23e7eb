//! Solana RPC ledger adapter — local keypair signing + send-and-confirm.

use crate::domain::market::Market;
use crate::error::LedgerError;
use crate::ledger::{Ledger, Signature, VaultBalance};
use crate::program::constants::PROGRAM_ID;
use crate::program::instructions::{
    build_cancel_order_ix, build_deposit_ix, build_place_order_ix, build_withdraw_ix,
};
use crate::program::pda::{get_associated_token_address, get_market_pda, get_vault_pda};
use crate::shared::{OrderId, Side};

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_commitment_config::CommitmentConfig;
use solana_instruction::Instruction;
use solana_keypair::Keypair;
use solana_pubkey::Pubkey;
use solana_signer::Signer;
use solana_transaction::Transaction;

/// Ledger implementation backed by a Solana RPC node and a local keypair.
pub struct SolanaLedger {
    rpc: RpcClient,
    keypair: Keypair,
    program_id: Pubkey,
}

impl SolanaLedger {
    pub fn new(rpc_url: &str, keypair: Keypair) -> Self {
        Self {
            rpc: RpcClient::new_with_commitment(rpc_url.to_string(), CommitmentConfig::confirmed()),
            keypair,
            program_id: PROGRAM_ID,
        }
    }

    pub fn with_program_id(rpc_url: &str, keypair: Keypair, program_id: Pubkey) -> Self {
        Self {
            rpc: RpcClient::new_with_commitment(rpc_url.to_string(), CommitmentConfig::confirmed()),
            keypair,
            program_id,
        }
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    fn market_pda(&self, market: &Market) -> Result<Pubkey, LedgerError> {
        let base = market
            .base_mint
            .to_pubkey()
            .map_err(LedgerError::InvalidAddress)?;
        let quote = market
            .quote_mint
            .to_pubkey()
            .map_err(LedgerError::InvalidAddress)?;
        Ok(get_market_pda(&base, &quote, &self.program_id).0)
    }

    /// The signer's associated token account for the chosen side of a market.
    fn token_account(&self, market: &Market, is_base: bool) -> Result<Pubkey, LedgerError> {
        let mint = if is_base {
            &market.base_mint
        } else {
            &market.quote_mint
        };
        let mint = mint.to_pubkey().map_err(LedgerError::InvalidAddress)?;
        Ok(get_associated_token_address(&self.keypair.pubkey(), &mint))
    }

    /// Sign and submit one instruction, waiting for confirmation.
    async fn send(&self, ix: Instruction) -> Result<Signature, LedgerError> {
        let blockhash = self
            .rpc
            .get_latest_blockhash()
            .await
            .map_err(|e| LedgerError::Rpc(e.to_string()))?;

        let tx = Transaction::new_signed_with_payer(
            &[ix],
            Some(&self.keypair.pubkey()),
            &[&self.keypair],
            blockhash,
        );

        self.rpc
            .send_and_confirm_transaction(&tx)
            .await
            .map(|sig| sig.to_string())
            .map_err(map_rpc_error)
    }
}

fn map_rpc_error(e: solana_client::client_error::ClientError) -> LedgerError {
    let msg = e.to_string();
    let lower = msg.to_lowercase();
    if lower.contains("blockhash") {
        LedgerError::BlockhashExpired
    } else if lower.contains("insufficient") {
        LedgerError::InsufficientFunds
    } else {
        LedgerError::Rpc(msg)
    }
}

#[async_trait]
impl Ledger for SolanaLedger {
    async fn submit_place(
        &self,
        market: &Market,
        order_id: OrderId,
        side: Side,
        price: u64,
        size: u64,
    ) -> Result<Signature, LedgerError> {
        let market_pda = self.market_pda(market)?;
        let ix = build_place_order_ix(
            &self.keypair.pubkey(),
            &market_pda,
            order_id.as_u128(),
            side,
            price,
            size,
            &self.program_id,
        );
        self.send(ix).await
    }

    async fn submit_cancel(
        &self,
        market: &Market,
        order_id: OrderId,
    ) -> Result<Signature, LedgerError> {
        let market_pda = self.market_pda(market)?;
        let ix = build_cancel_order_ix(
            &self.keypair.pubkey(),
            &market_pda,
            order_id.as_u128(),
            &self.program_id,
        );
        self.send(ix).await
    }

    async fn submit_deposit(
        &self,
        market: &Market,
        amount: u64,
        is_base: bool,
    ) -> Result<Signature, LedgerError> {
        let market_pda = self.market_pda(market)?;
        let token_account = self.token_account(market, is_base)?;
        let ix = build_deposit_ix(
            &self.keypair.pubkey(),
            &market_pda,
            &token_account,
            amount,
            is_base,
            &self.program_id,
        );
        self.send(ix).await
    }

    async fn submit_withdraw(
        &self,
        market: &Market,
        amount: u64,
        is_base: bool,
    ) -> Result<Signature, LedgerError> {
        let market_pda = self.market_pda(market)?;
        let token_account = self.token_account(market, is_base)?;
        let ix = build_withdraw_ix(
            &self.keypair.pubkey(),
            &market_pda,
            &token_account,
            amount,
            is_base,
            &self.program_id,
        );
        self.send(ix).await
    }

    async fn vault_balance(&self, market: &Market) -> Result<Option<VaultBalance>, LedgerError> {
        let market_pda = self.market_pda(market)?;
        let (vault, _) = get_vault_pda(&self.keypair.pubkey(), &market_pda, &self.program_id);

        let response = self
            .rpc
            .get_account_with_commitment(&vault, CommitmentConfig::confirmed())
            .await
            .map_err(|e| LedgerError::Rpc(e.to_string()))?;

        match response.value {
            Some(account) => VaultBalance::from_account_data(&account.data)
                .map(Some)
                .ok_or_else(|| LedgerError::Rpc("malformed vault account".to_string())),
            None => Ok(None),
        }
    }
}

//! Constants for the dcex settlement program.
//!
//! Program ID, PDA seeds, and instruction discriminators matching the
//! on-chain program exactly.

use solana_pubkey::Pubkey;

/// dcex settlement program ID.
pub const PROGRAM_ID: Pubkey =
    Pubkey::from_str_const("3Y2dNgp8WVLTNptUSUZY48cHCkB5wBRKJmDrC9WJspFo");

/// SPL Token program ID.
pub const TOKEN_PROGRAM_ID: Pubkey =
    Pubkey::from_str_const("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");

/// Associated Token Account program ID.
pub const ASSOCIATED_TOKEN_PROGRAM_ID: Pubkey =
    Pubkey::from_str_const("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");

// ============================================================================
// Instruction Discriminators
// ============================================================================

/// Instruction discriminators (single byte indices).
pub mod instruction {
    pub const INITIALIZE_MARKET: u8 = 0;
    pub const DEPOSIT: u8 = 1;
    pub const WITHDRAW: u8 = 2;
    pub const PLACE_ORDER: u8 = 3;
    pub const CANCEL_ORDER: u8 = 4;
    pub const SETTLE_TRADE: u8 = 5;
}

// ============================================================================
// PDA Seeds
// ============================================================================

/// Market PDA seed.
pub const MARKET_SEED: &[u8] = b"market";
/// User vault PDA seed.
pub const VAULT_SEED: &[u8] = b"vault";
/// Order PDA seed.
pub const ORDER_SEED: &[u8] = b"order";
/// Escrow token account PDA seed.
pub const ESCROW_SEED: &[u8] = b"escrow";
/// Escrow side discriminator seeds.
pub const ESCROW_BASE: &[u8] = b"base";
pub const ESCROW_QUOTE: &[u8] = b"quote";

// ============================================================================
// Account Layout
// ============================================================================

/// Vault account size: 8-byte discriminator, user and market pubkeys, then
/// four u64 balance fields.
pub const VAULT_ACCOUNT_SIZE: usize = 104;
/// Byte offset of the balance fields within a vault account.
pub const VAULT_BALANCES_OFFSET: usize = 72;

// ============================================================================
// Limits
// ============================================================================

/// Upper bound on fee rates accepted at market initialization.
pub const MAX_FEE_BPS: u16 = 1_000;

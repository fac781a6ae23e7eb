//! On-chain program layer — PDAs, instruction builders, account parsing.
//!
//! Byte-for-byte mirror of the settlement program's wire format. No RPC
//! here: builders return [`solana_instruction::Instruction`] values and the
//! ledger layer decides how to sign and submit them.

pub mod constants;
pub mod instructions;
pub mod pda;
pub mod vault;

pub use instructions::{
    build_cancel_order_ix, build_deposit_ix, build_place_order_ix, build_withdraw_ix,
};
pub use pda::{
    get_associated_token_address, get_escrow_pda, get_market_pda, get_order_pda, get_vault_pda,
};
pub use vault::VaultBalance;

//! PDA derivation for the dcex settlement program.

use crate::program::constants::{
    ASSOCIATED_TOKEN_PROGRAM_ID, ESCROW_BASE, ESCROW_QUOTE, ESCROW_SEED, MARKET_SEED, ORDER_SEED,
    TOKEN_PROGRAM_ID, VAULT_SEED,
};
use solana_pubkey::Pubkey;

/// Market PDA: `["market", base_mint, quote_mint]`.
pub fn get_market_pda(
    base_mint: &Pubkey,
    quote_mint: &Pubkey,
    program_id: &Pubkey,
) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[MARKET_SEED, base_mint.as_ref(), quote_mint.as_ref()],
        program_id,
    )
}

/// User vault PDA: `["vault", user, market]`.
pub fn get_vault_pda(user: &Pubkey, market: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[VAULT_SEED, user.as_ref(), market.as_ref()], program_id)
}

/// Order PDA: `["order", order_id]`, id as 16 little-endian bytes.
pub fn get_order_pda(order_id: u128, program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[ORDER_SEED, &order_id.to_le_bytes()], program_id)
}

/// Escrow token PDA: `["escrow", market, "base"|"quote"]`.
pub fn get_escrow_pda(market: &Pubkey, is_base: bool, program_id: &Pubkey) -> (Pubkey, u8) {
    let side = if is_base { ESCROW_BASE } else { ESCROW_QUOTE };
    Pubkey::find_program_address(&[ESCROW_SEED, market.as_ref(), side], program_id)
}

/// Associated token account for a wallet and mint.
pub fn get_associated_token_address(wallet: &Pubkey, mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[wallet.as_ref(), TOKEN_PROGRAM_ID.as_ref(), mint.as_ref()],
        &ASSOCIATED_TOKEN_PROGRAM_ID,
    )
    .0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::constants::PROGRAM_ID;

    #[test]
    fn test_pdas_are_deterministic() {
        let user = Pubkey::new_unique();
        let market = Pubkey::new_unique();
        let (a, bump_a) = get_vault_pda(&user, &market, &PROGRAM_ID);
        let (b, bump_b) = get_vault_pda(&user, &market, &PROGRAM_ID);
        assert_eq!(a, b);
        assert_eq!(bump_a, bump_b);
    }

    #[test]
    fn test_order_pda_distinct_per_id() {
        let (a, _) = get_order_pda(1, &PROGRAM_ID);
        let (b, _) = get_order_pda(2, &PROGRAM_ID);
        assert_ne!(a, b);
    }

    #[test]
    fn test_escrow_pda_distinct_per_side() {
        let market = Pubkey::new_unique();
        let (base, _) = get_escrow_pda(&market, true, &PROGRAM_ID);
        let (quote, _) = get_escrow_pda(&market, false, &PROGRAM_ID);
        assert_ne!(base, quote);
    }
}

//! Instruction builders for the dcex settlement program.

use solana_instruction::{AccountMeta, Instruction};
use solana_pubkey::Pubkey;

use crate::program::constants::{instruction, TOKEN_PROGRAM_ID};
use crate::program::pda::{get_escrow_pda, get_order_pda, get_vault_pda};
use crate::shared::Side;

fn system_program_id() -> Pubkey {
    solana_system_interface::program::ID
}

/// Create an account meta for a signer+writable account.
fn signer_mut(pubkey: Pubkey) -> AccountMeta {
    AccountMeta::new(pubkey, true)
}

/// Create an account meta for a writable account.
fn writable(pubkey: Pubkey) -> AccountMeta {
    AccountMeta::new(pubkey, false)
}

/// Create an account meta for a read-only account.
fn readonly(pubkey: Pubkey) -> AccountMeta {
    AccountMeta::new_readonly(pubkey, false)
}

/// Build Deposit instruction.
///
/// Moves tokens from the user's token account into the market escrow and
/// credits their vault.
///
/// Accounts:
/// 0. user (signer, mut)
/// 1. market (readonly)
/// 2. user_vault (mut)
/// 3. user_token_account (mut)
/// 4. escrow (mut)
/// 5. token_program (readonly)
/// 6. system_program (readonly)
pub fn build_deposit_ix(
    user: &Pubkey,
    market: &Pubkey,
    user_token_account: &Pubkey,
    amount: u64,
    is_base: bool,
    program_id: &Pubkey,
) -> Instruction {
    let (vault, _) = get_vault_pda(user, market, program_id);
    let (escrow, _) = get_escrow_pda(market, is_base, program_id);

    let keys = vec![
        signer_mut(*user),
        readonly(*market),
        writable(vault),
        writable(*user_token_account),
        writable(escrow),
        readonly(TOKEN_PROGRAM_ID),
        readonly(system_program_id()),
    ];

    // Data: [discriminator, amount (u64 LE), is_base (u8)]
    let mut data = Vec::with_capacity(10);
    data.push(instruction::DEPOSIT);
    data.extend_from_slice(&amount.to_le_bytes());
    data.push(is_base as u8);

    Instruction {
        program_id: *program_id,
        accounts: keys,
        data,
    }
}

/// Build Withdraw instruction.
///
/// Moves unlocked tokens out of the escrow back to the user's token account.
/// The program rejects withdrawals that would dip into locked balance.
///
/// Accounts: same as Deposit minus the system program (nothing is created).
pub fn build_withdraw_ix(
    user: &Pubkey,
    market: &Pubkey,
    user_token_account: &Pubkey,
    amount: u64,
    is_base: bool,
    program_id: &Pubkey,
) -> Instruction {
    let (vault, _) = get_vault_pda(user, market, program_id);
    let (escrow, _) = get_escrow_pda(market, is_base, program_id);

    let keys = vec![
        signer_mut(*user),
        readonly(*market),
        writable(vault),
        writable(*user_token_account),
        writable(escrow),
        readonly(TOKEN_PROGRAM_ID),
    ];

    let mut data = Vec::with_capacity(10);
    data.push(instruction::WITHDRAW);
    data.extend_from_slice(&amount.to_le_bytes());
    data.push(is_base as u8);

    Instruction {
        program_id: *program_id,
        accounts: keys,
        data,
    }
}

/// Build PlaceOrder instruction.
///
/// Locks vault balance and creates the order account whose PDA is derived
/// from the client-generated order id.
///
/// Accounts:
/// 0. user (signer, mut)
/// 1. market (readonly)
/// 2. user_vault (mut)
/// 3. order (mut) - Order PDA
/// 4. system_program (readonly)
pub fn build_place_order_ix(
    user: &Pubkey,
    market: &Pubkey,
    order_id: u128,
    side: Side,
    price: u64,
    size: u64,
    program_id: &Pubkey,
) -> Instruction {
    let (vault, _) = get_vault_pda(user, market, program_id);
    let (order, _) = get_order_pda(order_id, program_id);

    let keys = vec![
        signer_mut(*user),
        readonly(*market),
        writable(vault),
        writable(order),
        readonly(system_program_id()),
    ];

    // Data: [discriminator, order_id (u128 LE), side (u8), price (u64 LE), size (u64 LE)]
    let mut data = Vec::with_capacity(34);
    data.push(instruction::PLACE_ORDER);
    data.extend_from_slice(&order_id.to_le_bytes());
    data.push(match side {
        Side::Buy => 0,
        Side::Sell => 1,
    });
    data.extend_from_slice(&price.to_le_bytes());
    data.extend_from_slice(&size.to_le_bytes());

    Instruction {
        program_id: *program_id,
        accounts: keys,
        data,
    }
}

/// Build CancelOrder instruction.
///
/// Releases the remaining locked balance and closes the order account.
///
/// Accounts:
/// 0. user (signer, mut)
/// 1. market (readonly)
/// 2. user_vault (mut)
/// 3. order (mut)
pub fn build_cancel_order_ix(
    user: &Pubkey,
    market: &Pubkey,
    order_id: u128,
    program_id: &Pubkey,
) -> Instruction {
    let (vault, _) = get_vault_pda(user, market, program_id);
    let (order, _) = get_order_pda(order_id, program_id);

    let keys = vec![
        signer_mut(*user),
        readonly(*market),
        writable(vault),
        writable(order),
    ];

    Instruction {
        program_id: *program_id,
        accounts: keys,
        data: vec![instruction::CANCEL_ORDER],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::constants::PROGRAM_ID;

    #[test]
    fn test_deposit_ix_layout() {
        let user = Pubkey::new_unique();
        let market = Pubkey::new_unique();
        let token_account = Pubkey::new_unique();
        let ix = build_deposit_ix(&user, &market, &token_account, 5_000, true, &PROGRAM_ID);

        assert_eq!(ix.accounts.len(), 7);
        assert!(ix.accounts[0].is_signer);
        assert!(ix.accounts[0].is_writable);
        assert_eq!(ix.accounts[3].pubkey, token_account);
        assert!(ix.accounts[3].is_writable);
        assert_eq!(ix.accounts[5].pubkey, TOKEN_PROGRAM_ID);
        assert_eq!(ix.accounts[6].pubkey, solana_system_interface::program::ID);
        assert_eq!(ix.data.len(), 10);
        assert_eq!(ix.data[0], instruction::DEPOSIT);
        assert_eq!(&ix.data[1..9], &5_000u64.to_le_bytes());
        assert_eq!(ix.data[9], 1);
    }

    #[test]
    fn test_withdraw_ix_layout() {
        let user = Pubkey::new_unique();
        let market = Pubkey::new_unique();
        let token_account = Pubkey::new_unique();
        let ix = build_withdraw_ix(&user, &market, &token_account, 7, false, &PROGRAM_ID);

        // No system program: withdraw creates nothing.
        assert_eq!(ix.accounts.len(), 6);
        assert_eq!(ix.accounts[3].pubkey, token_account);
        assert_eq!(ix.accounts[5].pubkey, TOKEN_PROGRAM_ID);
        assert_eq!(ix.data[0], instruction::WITHDRAW);
        assert_eq!(ix.data[9], 0);
    }

    #[test]
    fn test_place_order_ix_layout() {
        let user = Pubkey::new_unique();
        let market = Pubkey::new_unique();
        let order_id = 0xDEAD_BEEFu128;
        let ix = build_place_order_ix(
            &user,
            &market,
            order_id,
            Side::Sell,
            1_000_000_000,
            2_000_000_000,
            &PROGRAM_ID,
        );

        assert_eq!(ix.accounts.len(), 5);
        assert_eq!(ix.data.len(), 34);
        assert_eq!(ix.data[0], instruction::PLACE_ORDER);
        assert_eq!(&ix.data[1..17], &order_id.to_le_bytes());
        assert_eq!(ix.data[17], 1);
        assert_eq!(&ix.data[18..26], &1_000_000_000u64.to_le_bytes());
        assert_eq!(&ix.data[26..34], &2_000_000_000u64.to_le_bytes());

        // Order account comes from the id-derived PDA.
        let (order_pda, _) = get_order_pda(order_id, &PROGRAM_ID);
        assert_eq!(ix.accounts[3].pubkey, order_pda);
    }

    #[test]
    fn test_cancel_order_ix_layout() {
        let user = Pubkey::new_unique();
        let market = Pubkey::new_unique();
        let ix = build_cancel_order_ix(&user, &market, 42, &PROGRAM_ID);
        assert_eq!(ix.accounts.len(), 4);
        assert_eq!(ix.data, vec![instruction::CANCEL_ORDER]);
    }
}

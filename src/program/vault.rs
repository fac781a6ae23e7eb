//! Vault account parsing.

use crate::program::constants::{VAULT_ACCOUNT_SIZE, VAULT_BALANCES_OFFSET};

/// Balances held in a user's per-market vault.
///
/// Locked amounts back resting orders; only the available portion can be
/// withdrawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VaultBalance {
    pub base_balance: u64,
    pub quote_balance: u64,
    pub base_locked: u64,
    pub quote_locked: u64,
}

impl VaultBalance {
    /// Parse a raw vault account. Layout: 8-byte discriminator, user and
    /// market pubkeys, then four u64 LE balance fields.
    pub fn from_account_data(data: &[u8]) -> Option<Self> {
        if data.len() < VAULT_ACCOUNT_SIZE {
            return None;
        }
        let mut fields = [0u64; 4];
        for (i, field) in fields.iter_mut().enumerate() {
            let start = VAULT_BALANCES_OFFSET + i * 8;
            let bytes: [u8; 8] = data[start..start + 8].try_into().ok()?;
            *field = u64::from_le_bytes(bytes);
        }
        Some(Self {
            base_balance: fields[0],
            quote_balance: fields[1],
            base_locked: fields[2],
            quote_locked: fields[3],
        })
    }

    pub fn base_available(&self) -> u64 {
        self.base_balance.saturating_sub(self.base_locked)
    }

    pub fn quote_available(&self) -> u64 {
        self.quote_balance.saturating_sub(self.quote_locked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account_with_balances(base: u64, quote: u64, base_locked: u64, quote_locked: u64) -> Vec<u8> {
        let mut data = vec![0u8; VAULT_ACCOUNT_SIZE];
        data[72..80].copy_from_slice(&base.to_le_bytes());
        data[80..88].copy_from_slice(&quote.to_le_bytes());
        data[88..96].copy_from_slice(&base_locked.to_le_bytes());
        data[96..104].copy_from_slice(&quote_locked.to_le_bytes());
        data
    }

    #[test]
    fn test_parse_balances() {
        let data = account_with_balances(100, 200, 30, 40);
        let v = VaultBalance::from_account_data(&data).unwrap();
        assert_eq!(v.base_balance, 100);
        assert_eq!(v.quote_balance, 200);
        assert_eq!(v.base_locked, 30);
        assert_eq!(v.quote_locked, 40);
        assert_eq!(v.base_available(), 70);
        assert_eq!(v.quote_available(), 160);
    }

    #[test]
    fn test_short_account_rejected() {
        assert!(VaultBalance::from_account_data(&[0u8; 50]).is_none());
    }

    #[test]
    fn test_available_saturates() {
        let data = account_with_balances(10, 0, 20, 0);
        let v = VaultBalance::from_account_data(&data).unwrap();
        assert_eq!(v.base_available(), 0);
    }
}

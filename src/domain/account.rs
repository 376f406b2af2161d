use crate::error::LedgerError;
use serde::{Deserialize, Serialize};

/// A provisioned kiosk user: the RFID credential on their card, the secret
/// used by the front end's password page, and their balance in currency
/// minor units.
///
/// The balance is guarded by [`UserAccount::adjust`] and never goes
/// negative.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct UserAccount {
    pub rf_id: u64,
    pub secret: String,
    pub balance: i64,
}

impl UserAccount {
    pub fn new(rf_id: u64, secret: impl Into<String>, balance: i64) -> Self {
        Self {
            rf_id,
            secret: secret.into(),
            balance,
        }
    }

    /// Applies a signed delta to the balance, rejecting any adjustment that
    /// would make it negative or overflow. On rejection the balance is left
    /// exactly as it was.
    pub fn adjust(&mut self, delta: i64) -> Result<i64, LedgerError> {
        let updated = self
            .balance
            .checked_add(delta)
            .ok_or(LedgerError::WouldUnderflow {
                balance: self.balance,
                delta,
            })?;
        if updated < 0 {
            return Err(LedgerError::WouldUnderflow {
                balance: self.balance,
                delta,
            });
        }
        self.balance = updated;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjust_deposit_and_withdraw() {
        let mut account = UserAccount::new(5001, "pass123", 100);
        assert_eq!(account.adjust(250), Ok(350));
        assert_eq!(account.adjust(-350), Ok(0));
    }

    #[test]
    fn test_adjust_rejects_underflow() {
        let mut account = UserAccount::new(5001, "pass123", 100);
        let result = account.adjust(-101);
        assert_eq!(
            result,
            Err(LedgerError::WouldUnderflow {
                balance: 100,
                delta: -101
            })
        );
        // Balance must be untouched after a rejected adjustment.
        assert_eq!(account.balance, 100);
    }

    #[test]
    fn test_adjust_rejects_overflow() {
        let mut account = UserAccount::new(5001, "pass123", i64::MAX);
        assert!(account.adjust(1).is_err());
        assert_eq!(account.balance, i64::MAX);
    }
}

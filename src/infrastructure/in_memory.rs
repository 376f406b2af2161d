use crate::domain::account::UserAccount;
use crate::domain::ports::Ledger;
use crate::error::LedgerError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Thread-safe in-memory implementation of the Balance Ledger.
///
/// The outer `RwLock` guards the account map itself (create/delete); each
/// account sits behind its own `Mutex` so adjustments to different
/// identifiers proceed in parallel while adjustments to the same
/// identifier serialize.
#[derive(Default, Clone)]
pub struct InMemoryLedger {
    accounts: Arc<RwLock<HashMap<u64, Arc<Mutex<UserAccount>>>>>,
}

impl InMemoryLedger {
    /// Creates a new, empty ledger.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn lookup(&self, rf_id: u64) -> Result<i64, LedgerError> {
        let accounts = self.accounts.read().await;
        let account = accounts.get(&rf_id).ok_or(LedgerError::NotFound(rf_id))?;
        let account = account.lock().await;
        Ok(account.balance)
    }

    async fn create(&self, rf_id: u64, secret: &str, balance: i64) -> Result<(), LedgerError> {
        if balance < 0 {
            return Err(LedgerError::WouldUnderflow { balance, delta: 0 });
        }
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&rf_id) {
            return Err(LedgerError::AlreadyExists(rf_id));
        }
        accounts.insert(
            rf_id,
            Arc::new(Mutex::new(UserAccount::new(rf_id, secret, balance))),
        );
        Ok(())
    }

    async fn delete(&self, rf_id: u64) -> Result<(), LedgerError> {
        let mut accounts = self.accounts.write().await;
        accounts
            .remove(&rf_id)
            .map(|_| ())
            .ok_or(LedgerError::NotFound(rf_id))
    }

    async fn adjust(&self, rf_id: u64, delta: i64) -> Result<i64, LedgerError> {
        let entry = {
            let accounts = self.accounts.read().await;
            accounts
                .get(&rf_id)
                .cloned()
                .ok_or(LedgerError::NotFound(rf_id))?
        };
        // The map lock is released here; only this account is held while
        // the balance check and write happen as one step.
        let mut account = entry.lock().await;
        account.adjust(delta)
    }
}

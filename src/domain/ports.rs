use super::command::OutboundCommand;
use crate::error::{LedgerError, PublishError};
use async_trait::async_trait;
use std::sync::Arc;

/// The per-user balance store.
///
/// All operations are atomic with respect to concurrent callers on the
/// same identifier; adjustments to distinct identifiers do not block each
/// other.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Returns the balance for an account, in currency minor units.
    async fn lookup(&self, rf_id: u64) -> Result<i64, LedgerError>;

    /// Provisions a new account. Fails with `AlreadyExists` and performs no
    /// mutation if the identifier is taken.
    async fn create(&self, rf_id: u64, secret: &str, balance: i64) -> Result<(), LedgerError>;

    /// Removes an account.
    async fn delete(&self, rf_id: u64) -> Result<(), LedgerError>;

    /// Applies a signed delta to an account's balance and returns the new
    /// balance. Fails with `WouldUnderflow`, leaving the balance unchanged,
    /// rather than going negative.
    async fn adjust(&self, rf_id: u64, delta: i64) -> Result<i64, LedgerError>;
}

pub type LedgerHandle = Arc<dyn Ledger>;

/// Sink for outbound hardware commands.
#[async_trait]
pub trait CommandPublisher: Send + Sync {
    /// Publishes one command, retrying a bounded number of times before
    /// reporting `PublishFailed`. Never blocks beyond a short timeout.
    async fn emit(&self, command: &OutboundCommand) -> Result<(), PublishError>;
}

pub type PublisherHandle = Arc<dyn CommandPublisher>;

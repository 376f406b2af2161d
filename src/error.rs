use thiserror::Error;

/// Failures of the Balance Ledger. Every variant is a typed outcome the
/// caller is expected to handle; none of them indicate a broken store.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LedgerError {
    #[error("unknown account: {0}")]
    NotFound(u64),
    #[error("account already exists: {0}")]
    AlreadyExists(u64),
    #[error("adjusting balance {balance} by {delta} would leave it out of range")]
    WouldUnderflow { balance: i64, delta: i64 },
}

/// A bus payload that could not be turned into a kiosk event.
///
/// Decode failures are logged and dropped by the listener; they never
/// propagate into the state machine.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("payload is not a valid wire message: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A provisioning row that could not be parsed.
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("expected 2 or 3 fields, got {0}")]
    WrongArity(usize),
}

/// Failures of the outbound command path. A failed publish is reported to
/// the caller but never rolls back a session transition that already
/// committed; the state machine and the hardware channel are not
/// transactionally linked.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("failed to encode outbound command: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("publish to {subject} failed after {attempts} attempts: {reason}")]
    PublishFailed {
        subject: String,
        attempts: u32,
        reason: String,
    },
}

use crate::domain::ports::Ledger;
use crate::error::{LedgerError, ProvisionError};
use std::io::Read;
use std::path::Path;

/// One provisioning row: `rf_id,secret[,balance]`. The balance column is
/// optional and defaults to zero.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ProvisionRow {
    pub rf_id: u64,
    pub secret: String,
    pub balance: Option<i64>,
}

impl ProvisionRow {
    /// Parses a record by arity: two fields leave the balance unset, three
    /// fields carry it explicitly. Anything else is a malformed row.
    fn from_record(record: &csv::StringRecord) -> Result<Self, ProvisionError> {
        match record.len() {
            2 => {
                let (rf_id, secret): (u64, String) = record.deserialize(None)?;
                Ok(Self {
                    rf_id,
                    secret,
                    balance: None,
                })
            }
            3 => {
                let (rf_id, secret, balance): (u64, String, i64) = record.deserialize(None)?;
                Ok(Self {
                    rf_id,
                    secret,
                    balance: Some(balance),
                })
            }
            arity => Err(ProvisionError::WrongArity(arity)),
        }
    }
}

/// Reads account provisioning rows from a headerless CSV source.
///
/// Wraps `csv::Reader` with trimming and flexible record lengths, so two-
/// and three-column rows mix freely and a malformed row surfaces as an
/// error item instead of aborting the stream.
pub struct ProvisionReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> ProvisionReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily parsed rows.
    pub fn rows(self) -> impl Iterator<Item = Result<ProvisionRow, ProvisionError>> {
        self.reader.into_records().map(|record| {
            record
                .map_err(ProvisionError::from)
                .and_then(|record| ProvisionRow::from_record(&record))
        })
    }
}

/// Bulk-loads accounts from a provisioning file into the ledger.
///
/// Existing identifiers and malformed rows are skipped with a log line,
/// never fatal. Returns the number of accounts inserted.
pub async fn load_accounts(ledger: &dyn Ledger, path: &Path) -> std::io::Result<usize> {
    let file = std::fs::File::open(path)?;
    let mut inserted = 0;
    for row in ProvisionReader::new(file).rows() {
        match row {
            Ok(row) => {
                let balance = row.balance.unwrap_or(0);
                match ledger.create(row.rf_id, &row.secret, balance).await {
                    Ok(()) => inserted += 1,
                    Err(LedgerError::AlreadyExists(rf_id)) => {
                        tracing::debug!(rf_id, "skipping already provisioned account");
                    }
                    Err(e) => {
                        tracing::warn!(rf_id = row.rf_id, error = %e, "skipping invalid account row");
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed provisioning row");
            }
        }
    }
    tracing::info!(inserted, path = %path.display(), "account provisioning finished");
    Ok(inserted)
}

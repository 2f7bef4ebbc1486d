use chama_core::LoanId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Result alias for ledger store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Error type surfaced by ledger storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A compare-and-swap lost the race: the stored balance no longer
    /// matches the snapshot the caller computed against. Recoverable by
    /// re-reading and recomputing.
    #[error("write conflict on {entity}: expected balance {expected}, found {found}")]
    Conflict {
        entity: String,
        expected: Decimal,
        found: Decimal,
    },

    /// A payment would push a loan balance negative.
    #[error("payment of {amount} exceeds remaining balance {remaining} on loan {loan}")]
    Overpayment {
        loan: LoanId,
        amount: Decimal,
        remaining: Decimal,
    },

    /// Transient backend failure; safe to retry idempotent calls.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("duplicate key: {0}")]
    Duplicate(String),

    #[error("missing {0}")]
    Missing(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        match &value {
            rusqlite::Error::SqliteFailure(err, _)
                if matches!(
                    err.code,
                    rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
                ) =>
            {
                Self::Unavailable(value.to_string())
            }
            _ => Self::Storage(value.to_string()),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Storage(value.to_string())
    }
}

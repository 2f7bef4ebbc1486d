use chrono::NaiveDate;
use thiserror::Error;

use chama_core::GroupId;
use chama_engine::EngineError;
use chama_ledger::StoreError;

/// Result alias for coordinator operations.
pub type SubmissionResult<T> = Result<T, SubmissionError>;

/// Errors surfaced to the caller of a submission.
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// The (group, date) pair was already reconciled. Resubmission is
    /// rejected rather than double-applied.
    #[error("group {group} already has a submission for {date}")]
    Duplicate { group: GroupId, date: NaiveDate },

    #[error("submission roster is empty")]
    EmptyRoster,

    /// Concurrent balance changes kept invalidating the allocation
    /// snapshot, even after recomputing.
    #[error("allocation conflict persisted after {attempts} attempts")]
    Conflict { attempts: u32 },

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

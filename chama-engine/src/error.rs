use chama_core::LoanId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Result alias for pure engine computations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised by the calculation stages.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum EngineError {
    /// The loan schedule cannot produce a weekly installment. Fatal for
    /// the affected member's row only, never for the whole meeting.
    #[error("loan {loan} has an invalid schedule: weeks_due must be positive")]
    InvalidSchedule { loan: LoanId },

    /// Defensive input check; pooled collections are sums of
    /// non-negative categories.
    #[error("allocation pool cannot be negative: {pool}")]
    NegativePool { pool: Decimal },

    /// The waterfall failed its conservation check. This is an internal
    /// consistency fault: the submission must abort with zero writes.
    #[error(
        "allocation leaked value: pool {pool}, applied {applied}, to savings {to_savings}"
    )]
    AllocationOverrun {
        pool: Decimal,
        applied: Decimal,
        to_savings: Decimal,
    },
}

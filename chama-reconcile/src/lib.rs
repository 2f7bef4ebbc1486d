//! Submission transaction coordinator.
//!
//! Runs the pure calculation stages over a meeting roster, then applies
//! the resulting ledger mutations as a single logical unit: a saga of
//! keyed intents whose terminal commit is the submission status flip.
//! Partial runs stay visibly incomplete and resume without double
//! application.

mod clock;
mod coordinator;
mod error;
mod intent;
mod retry;

pub use clock::{Clock, FixedClock, SystemClock};
pub use coordinator::{
    CoordinatorConfig, SubmissionCoordinator, SubmissionPreview, SubmissionReceipt,
};
pub use error::{SubmissionError, SubmissionResult};
pub use intent::{BalanceMutation, MutationIntent};

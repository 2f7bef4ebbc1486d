use chrono::NaiveDate;
use rust_decimal::Decimal;

use chama_core::{
    GroupId, GroupLoan, LoanId, MemberId, MemberLoan, Submission, SubmissionId, SubmissionStatus,
};

use crate::{LedgerRecord, StoreResult};

/// Capability contract between the reconciliation coordinator and durable
/// storage.
///
/// Each call is atomic on its own; cross-call atomicity is the
/// coordinator's saga problem. Balance changes are increments applied at
/// the store, never application-level read-modify-write, so unrelated
/// submissions touching the same member can interleave safely.
pub trait LedgerStore: Send + Sync {
    fn member_loan(&self, member: MemberId) -> StoreResult<Option<MemberLoan>>;

    /// Outstanding loans for a group, oldest approval first: the
    /// priority order the waterfall consumes.
    fn outstanding_group_loans(&self, group: GroupId) -> StoreResult<Vec<GroupLoan>>;

    fn find_submission(&self, group: GroupId, date: NaiveDate) -> StoreResult<Option<Submission>>;

    /// Insert a new submission row. A (group, date) collision yields
    /// `StoreError::Duplicate`.
    fn insert_submission(&self, submission: &Submission) -> StoreResult<()>;

    fn set_submission_status(
        &self,
        id: SubmissionId,
        status: SubmissionStatus,
    ) -> StoreResult<()>;

    /// Atomically add to a member's savings balance; returns the new
    /// balance.
    fn credit_member_savings(&self, member: MemberId, delta: Decimal) -> StoreResult<Decimal>;

    fn credit_group_savings(&self, group: GroupId, delta: Decimal) -> StoreResult<Decimal>;

    fn credit_group_social_fund(&self, group: GroupId, delta: Decimal) -> StoreResult<Decimal>;

    /// Apply one weekly payment: decrement the remaining balance and bump
    /// `weeks_paid` by exactly one. Refuses amounts above the remaining
    /// balance.
    fn apply_member_loan_payment(&self, loan: LoanId, amount: Decimal) -> StoreResult<()>;

    /// Compare-and-swap decrement of a group loan's outstanding balance;
    /// returns the new balance. Fails with `StoreError::Conflict` when
    /// the stored balance no longer matches `expected_outstanding`.
    fn apply_group_loan_payment(
        &self,
        loan: LoanId,
        expected_outstanding: Decimal,
        applied: Decimal,
    ) -> StoreResult<Decimal>;

    fn record_exists(&self, key: &str) -> StoreResult<bool>;

    /// Insert or replace a record by its idempotency key.
    fn upsert_record(&self, record: &LedgerRecord) -> StoreResult<()>;

    /// All records attached to a submission, used to resume partial runs.
    fn records_for_submission(&self, submission: SubmissionId)
        -> StoreResult<Vec<LedgerRecord>>;
}

use std::collections::HashMap;

use chrono::NaiveDate;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use chama_core::{
    GroupId, GroupLoan, LoanId, MemberId, MemberLoan, MemberLoanStatus, Submission, SubmissionId,
    SubmissionStatus,
};

use crate::{LedgerRecord, LedgerStore, StoreError, StoreResult};

/// In-memory ledger store used by tests and speculative previews.
///
/// Mirrors the semantics of the SQLite backend, including conflict and
/// overpayment refusals, behind a single process-wide lock.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    member_loans: HashMap<LoanId, MemberLoan>,
    loans_by_member: HashMap<MemberId, LoanId>,
    group_loans: HashMap<LoanId, GroupLoan>,
    member_savings: HashMap<MemberId, Decimal>,
    group_savings: HashMap<GroupId, Decimal>,
    group_social_fund: HashMap<GroupId, Decimal>,
    submissions: HashMap<SubmissionId, Submission>,
    submissions_by_key: HashMap<(GroupId, NaiveDate), SubmissionId>,
    records: HashMap<String, LedgerRecord>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed or replace a member loan snapshot.
    pub fn put_member_loan(&self, loan: MemberLoan) {
        let mut inner = self.inner.lock();
        inner.loans_by_member.insert(loan.member, loan.id);
        inner.member_loans.insert(loan.id, loan);
    }

    /// Seed or replace a group loan snapshot.
    pub fn put_group_loan(&self, loan: GroupLoan) {
        self.inner.lock().group_loans.insert(loan.id, loan);
    }

    pub fn member_savings(&self, member: MemberId) -> Decimal {
        self.inner
            .lock()
            .member_savings
            .get(&member)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn group_savings(&self, group: GroupId) -> Decimal {
        self.inner
            .lock()
            .group_savings
            .get(&group)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn group_social_fund(&self, group: GroupId) -> Decimal {
        self.inner
            .lock()
            .group_social_fund
            .get(&group)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn group_loan(&self, loan: LoanId) -> Option<GroupLoan> {
        self.inner.lock().group_loans.get(&loan).cloned()
    }

    pub fn member_loan_by_id(&self, loan: LoanId) -> Option<MemberLoan> {
        self.inner.lock().member_loans.get(&loan).cloned()
    }

    pub fn records_of_kind(&self, kind: crate::RecordKind) -> Vec<LedgerRecord> {
        self.inner
            .lock()
            .records
            .values()
            .filter(|record| record.kind == kind)
            .cloned()
            .collect()
    }

    pub fn record_count(&self) -> usize {
        self.inner.lock().records.len()
    }

    pub fn submission(&self, id: SubmissionId) -> Option<Submission> {
        self.inner.lock().submissions.get(&id).cloned()
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn member_loan(&self, member: MemberId) -> StoreResult<Option<MemberLoan>> {
        let inner = self.inner.lock();
        Ok(inner
            .loans_by_member
            .get(&member)
            .and_then(|id| inner.member_loans.get(id))
            .cloned())
    }

    fn outstanding_group_loans(&self, group: GroupId) -> StoreResult<Vec<GroupLoan>> {
        let inner = self.inner.lock();
        let mut loans: Vec<_> = inner
            .group_loans
            .values()
            .filter(|loan| loan.group == group && loan.is_outstanding())
            .cloned()
            .collect();
        loans.sort_by_key(|loan| (loan.approved_on, loan.id));
        Ok(loans)
    }

    fn find_submission(&self, group: GroupId, date: NaiveDate) -> StoreResult<Option<Submission>> {
        let inner = self.inner.lock();
        Ok(inner
            .submissions_by_key
            .get(&(group, date))
            .and_then(|id| inner.submissions.get(id))
            .cloned())
    }

    fn insert_submission(&self, submission: &Submission) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        let key = (submission.group, submission.date);
        if inner.submissions_by_key.contains_key(&key) {
            return Err(StoreError::Duplicate(format!(
                "submission for group {} on {}",
                submission.group, submission.date
            )));
        }
        inner.submissions_by_key.insert(key, submission.id);
        inner.submissions.insert(submission.id, submission.clone());
        Ok(())
    }

    fn set_submission_status(
        &self,
        id: SubmissionId,
        status: SubmissionStatus,
    ) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        let submission = inner
            .submissions
            .get_mut(&id)
            .ok_or_else(|| StoreError::Missing(format!("submission {id}")))?;
        submission.status = status;
        Ok(())
    }

    fn credit_member_savings(&self, member: MemberId, delta: Decimal) -> StoreResult<Decimal> {
        let mut inner = self.inner.lock();
        let balance = inner.member_savings.entry(member).or_default();
        *balance += delta;
        Ok(*balance)
    }

    fn credit_group_savings(&self, group: GroupId, delta: Decimal) -> StoreResult<Decimal> {
        let mut inner = self.inner.lock();
        let balance = inner.group_savings.entry(group).or_default();
        *balance += delta;
        Ok(*balance)
    }

    fn credit_group_social_fund(&self, group: GroupId, delta: Decimal) -> StoreResult<Decimal> {
        let mut inner = self.inner.lock();
        let balance = inner.group_social_fund.entry(group).or_default();
        *balance += delta;
        Ok(*balance)
    }

    fn apply_member_loan_payment(&self, loan: LoanId, amount: Decimal) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        let loan = inner
            .member_loans
            .get_mut(&loan)
            .ok_or_else(|| StoreError::Missing(format!("member loan {loan}")))?;
        if amount > loan.remaining_balance {
            return Err(StoreError::Overpayment {
                loan: loan.id,
                amount,
                remaining: loan.remaining_balance,
            });
        }
        loan.remaining_balance -= amount;
        loan.weeks_paid += 1;
        if loan.remaining_balance.is_zero() {
            loan.status = MemberLoanStatus::Repaid;
        }
        Ok(())
    }

    fn apply_group_loan_payment(
        &self,
        loan: LoanId,
        expected_outstanding: Decimal,
        applied: Decimal,
    ) -> StoreResult<Decimal> {
        let mut inner = self.inner.lock();
        let loan = inner
            .group_loans
            .get_mut(&loan)
            .ok_or_else(|| StoreError::Missing(format!("group loan {loan}")))?;
        if loan.outstanding_balance != expected_outstanding {
            return Err(StoreError::Conflict {
                entity: format!("group loan {}", loan.id),
                expected: expected_outstanding,
                found: loan.outstanding_balance,
            });
        }
        if applied > loan.outstanding_balance {
            return Err(StoreError::Overpayment {
                loan: loan.id,
                amount: applied,
                remaining: loan.outstanding_balance,
            });
        }
        loan.outstanding_balance -= applied;
        if loan.outstanding_balance.is_zero() {
            loan.status = chama_core::GroupLoanStatus::Repaid;
        }
        Ok(loan.outstanding_balance)
    }

    fn record_exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.inner.lock().records.contains_key(key))
    }

    fn upsert_record(&self, record: &LedgerRecord) -> StoreResult<()> {
        self.inner
            .lock()
            .records
            .insert(record.key.clone(), record.clone());
        Ok(())
    }

    fn records_for_submission(
        &self,
        submission: SubmissionId,
    ) -> StoreResult<Vec<LedgerRecord>> {
        Ok(self
            .inner
            .lock()
            .records
            .values()
            .filter(|record| record.submission == submission)
            .cloned()
            .collect())
    }
}

use rust_decimal::Decimal;

use chama_core::{GroupId, LoanId, MemberId, RetryPolicy};
use chama_ledger::{LedgerRecord, LedgerStore, StoreResult};

use crate::retry::with_retry;

/// Balance change attached to a mutation intent. Each variant maps onto
/// one atomic store operation.
#[derive(Clone, Debug, PartialEq)]
pub enum BalanceMutation {
    CreditMemberSavings { member: MemberId, amount: Decimal },
    CreditGroupSavings { group: GroupId, amount: Decimal },
    CreditGroupSocialFund { group: GroupId, amount: Decimal },
    MemberLoanPayment { loan: LoanId, amount: Decimal },
    GroupLoanPayment {
        loan: LoanId,
        expected_outstanding: Decimal,
        applied: Decimal,
    },
}

/// One step of the submission saga: a marker record plus the balance
/// change it attests to.
///
/// The record key is deterministic, so replaying a partially applied
/// submission detects completed steps and skips them instead of
/// double-applying money.
#[derive(Clone, Debug)]
pub struct MutationIntent {
    pub record: LedgerRecord,
    pub mutation: Option<BalanceMutation>,
}

impl MutationIntent {
    pub fn record_only(record: LedgerRecord) -> Self {
        Self {
            record,
            mutation: None,
        }
    }

    pub fn with_mutation(record: LedgerRecord, mutation: BalanceMutation) -> Self {
        Self {
            record,
            mutation: Some(mutation),
        }
    }

    pub fn key(&self) -> &str {
        &self.record.key
    }
}

/// Execute one intent against the store. Returns whether it was applied
/// (false = already done by an earlier run).
///
/// The balance change runs before its marker record: a crash between the
/// two leaves the step unmarked and it is retried, never silently lost.
/// Only the existence probe and the marker upsert are retried on
/// transient failures; the balance change itself is not idempotent and
/// must not be blindly re-run.
pub(crate) fn execute(
    store: &dyn LedgerStore,
    retry: &RetryPolicy,
    intent: &MutationIntent,
) -> StoreResult<bool> {
    if with_retry(retry, || store.record_exists(intent.key()))? {
        return Ok(false);
    }
    if let Some(mutation) = &intent.mutation {
        apply_mutation(store, mutation)?;
    }
    with_retry(retry, || store.upsert_record(&intent.record))?;
    Ok(true)
}

fn apply_mutation(store: &dyn LedgerStore, mutation: &BalanceMutation) -> StoreResult<()> {
    match mutation {
        BalanceMutation::CreditMemberSavings { member, amount } => {
            store.credit_member_savings(*member, *amount)?;
        }
        BalanceMutation::CreditGroupSavings { group, amount } => {
            store.credit_group_savings(*group, *amount)?;
        }
        BalanceMutation::CreditGroupSocialFund { group, amount } => {
            store.credit_group_social_fund(*group, *amount)?;
        }
        BalanceMutation::MemberLoanPayment { loan, amount } => {
            store.apply_member_loan_payment(*loan, *amount)?;
        }
        BalanceMutation::GroupLoanPayment {
            loan,
            expected_outstanding,
            applied,
        } => {
            store.apply_group_loan_payment(*loan, *expected_outstanding, *applied)?;
        }
    }
    Ok(())
}

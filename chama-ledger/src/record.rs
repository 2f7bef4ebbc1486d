use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use chama_core::{GroupId, LoanId, MemberId, SubmissionId};

/// Kinds of durable rows the reconciliation engine produces.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Savings,
    SocialFund,
    Registration,
    Repayment,
    Fine,
    Attendance,
    Allocation,
    Commission,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Savings => "savings",
            RecordKind::SocialFund => "social_fund",
            RecordKind::Registration => "registration",
            RecordKind::Repayment => "repayment",
            RecordKind::Fine => "fine",
            RecordKind::Attendance => "attendance",
            RecordKind::Allocation => "allocation",
            RecordKind::Commission => "commission",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "savings" => Ok(RecordKind::Savings),
            "social_fund" => Ok(RecordKind::SocialFund),
            "registration" => Ok(RecordKind::Registration),
            "repayment" => Ok(RecordKind::Repayment),
            "fine" => Ok(RecordKind::Fine),
            "attendance" => Ok(RecordKind::Attendance),
            "allocation" => Ok(RecordKind::Allocation),
            "commission" => Ok(RecordKind::Commission),
            other => Err(format!("unknown record kind: {other}")),
        }
    }
}

/// Durable ledger row emitted during reconciliation.
///
/// `key` is the deterministic idempotency key: replaying a submission
/// upserts the same row instead of duplicating it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub id: Uuid,
    pub key: String,
    pub kind: RecordKind,
    pub group: GroupId,
    pub member: Option<MemberId>,
    pub loan: Option<LoanId>,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub submission: SubmissionId,
    pub recorded_at: DateTime<Utc>,
    pub detail: Option<serde_json::Value>,
}

impl LedgerRecord {
    /// Creates a record scoped to a submission. Timestamps come from the
    /// caller's clock, never from ambient time.
    pub fn new(
        key: impl Into<String>,
        kind: RecordKind,
        group: GroupId,
        date: NaiveDate,
        submission: SubmissionId,
        amount: Decimal,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            key: key.into(),
            kind,
            group,
            member: None,
            loan: None,
            amount,
            date,
            submission,
            recorded_at,
            detail: None,
        }
    }

    pub fn for_member(mut self, member: MemberId) -> Self {
        self.member = Some(member);
        self
    }

    pub fn for_loan(mut self, loan: LoanId) -> Self {
        self.loan = Some(loan);
        self
    }

    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = Some(detail);
        self
    }
}

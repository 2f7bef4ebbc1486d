use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{GroupId, LoanId, MemberId};

/// Lifecycle state of an individual member loan.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberLoanStatus {
    Active,
    Overdue,
    Repaid,
    Defaulted,
}

impl MemberLoanStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MemberLoanStatus::Active => "active",
            MemberLoanStatus::Overdue => "overdue",
            MemberLoanStatus::Repaid => "repaid",
            MemberLoanStatus::Defaulted => "defaulted",
        }
    }
}

impl fmt::Display for MemberLoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberLoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(MemberLoanStatus::Active),
            "overdue" => Ok(MemberLoanStatus::Overdue),
            "repaid" => Ok(MemberLoanStatus::Repaid),
            "defaulted" => Ok(MemberLoanStatus::Defaulted),
            other => Err(format!("unknown member loan status: {other}")),
        }
    }
}

/// Snapshot of a member loan as read from the ledger store.
///
/// `days_overdue` is derived from due dates held externally; the engine
/// only consumes it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemberLoan {
    pub id: LoanId,
    pub member: MemberId,
    pub principal: Decimal,
    pub remaining_balance: Decimal,
    pub weeks_due: u32,
    pub weeks_paid: u32,
    pub status: MemberLoanStatus,
    pub days_overdue: u32,
}

impl MemberLoan {
    /// Whether weekly collections should service this loan.
    pub fn is_payable(&self) -> bool {
        matches!(
            self.status,
            MemberLoanStatus::Active | MemberLoanStatus::Overdue
        ) && self.remaining_balance > Decimal::ZERO
    }
}

/// Lifecycle state of a loan owed collectively by a group.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupLoanStatus {
    Active,
    Overdue,
    Approved,
    Repaid,
}

impl GroupLoanStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            GroupLoanStatus::Active => "active",
            GroupLoanStatus::Overdue => "overdue",
            GroupLoanStatus::Approved => "approved",
            GroupLoanStatus::Repaid => "repaid",
        }
    }
}

impl fmt::Display for GroupLoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupLoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(GroupLoanStatus::Active),
            "overdue" => Ok(GroupLoanStatus::Overdue),
            "approved" => Ok(GroupLoanStatus::Approved),
            "repaid" => Ok(GroupLoanStatus::Repaid),
            other => Err(format!("unknown group loan status: {other}")),
        }
    }
}

/// Snapshot of a loan owed collectively by the group.
///
/// `approved_on` drives the oldest-approved-first priority the waterfall
/// relies on; the allocator never mutates it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupLoan {
    pub id: LoanId,
    pub group: GroupId,
    pub principal: Decimal,
    pub outstanding_balance: Decimal,
    pub status: GroupLoanStatus,
    pub approved_on: NaiveDate,
}

impl GroupLoan {
    /// Whether this loan can absorb pooled collections.
    pub fn is_outstanding(&self) -> bool {
        matches!(
            self.status,
            GroupLoanStatus::Active | GroupLoanStatus::Overdue
        ) && self.outstanding_balance > Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn member_loan(status: MemberLoanStatus, remaining: Decimal) -> MemberLoan {
        MemberLoan {
            id: LoanId::new(),
            member: MemberId::new(),
            principal: dec!(100000),
            remaining_balance: remaining,
            weeks_due: 20,
            weeks_paid: 4,
            status,
            days_overdue: 0,
        }
    }

    #[test]
    fn repaid_loans_are_not_payable() {
        assert!(member_loan(MemberLoanStatus::Active, dec!(80000)).is_payable());
        assert!(member_loan(MemberLoanStatus::Overdue, dec!(80000)).is_payable());
        assert!(!member_loan(MemberLoanStatus::Repaid, dec!(0)).is_payable());
        assert!(!member_loan(MemberLoanStatus::Defaulted, dec!(80000)).is_payable());
    }

    #[test]
    fn cleared_balance_is_not_payable_even_if_marked_active() {
        assert!(!member_loan(MemberLoanStatus::Active, dec!(0)).is_payable());
    }

    #[test]
    fn status_roundtrips_through_strings() {
        for status in [
            GroupLoanStatus::Active,
            GroupLoanStatus::Overdue,
            GroupLoanStatus::Approved,
            GroupLoanStatus::Repaid,
        ] {
            assert_eq!(status.as_str().parse::<GroupLoanStatus>(), Ok(status));
        }
    }
}

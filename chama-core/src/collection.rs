use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{LoanId, MemberId};

/// One member's row for a single meeting.
///
/// Entries are constructed transiently per meeting and never persisted as
/// mutable state; their effect survives only through the ledger records
/// they produce.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CollectionEntry {
    pub member: MemberId,
    pub savings: Decimal,
    pub loan_repayment: Decimal,
    pub fines: Decimal,
    pub social_fund: Decimal,
    pub registration: Decimal,
    pub is_absent: bool,
    pub loan: Option<LoanId>,
}

impl CollectionEntry {
    /// An all-zero row for a present member with no loan.
    pub fn zeroed(member: MemberId) -> Self {
        Self {
            member,
            savings: Decimal::ZERO,
            loan_repayment: Decimal::ZERO,
            fines: Decimal::ZERO,
            social_fund: Decimal::ZERO,
            registration: Decimal::ZERO,
            is_absent: false,
            loan: None,
        }
    }

    /// Whether the member carried a serviceable loan into the meeting.
    pub fn has_loan(&self) -> bool {
        self.loan.is_some()
    }
}

/// Parse an optional form amount. Blank or unparsable input counts as
/// zero so optional fields never fail a meeting; negative input is
/// clamped since collections are cash handed over.
pub fn amount_or_zero(raw: Option<&str>) -> Decimal {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| Decimal::from_str(s).ok())
        .unwrap_or(Decimal::ZERO)
        .max(Decimal::ZERO)
}

/// Category sums across all collection entries of one meeting.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeetingTotals {
    pub savings: Decimal,
    pub loan_repayments: Decimal,
    pub fines: Decimal,
    pub social_fund: Decimal,
    pub registration: Decimal,
    pub attendance_count: u32,
    pub grand_total: Decimal,
}

impl MeetingTotals {
    /// Amount subject to waterfall allocation. Registration fees are
    /// routed to group overhead and never enter the pool.
    pub fn pool_amount(&self) -> Decimal {
        self.savings + self.loan_repayments + self.social_fund + self.fines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn blank_and_garbage_amounts_count_as_zero() {
        assert_eq!(amount_or_zero(None), Decimal::ZERO);
        assert_eq!(amount_or_zero(Some("")), Decimal::ZERO);
        assert_eq!(amount_or_zero(Some("   ")), Decimal::ZERO);
        assert_eq!(amount_or_zero(Some("n/a")), Decimal::ZERO);
        assert_eq!(amount_or_zero(Some("-250")), Decimal::ZERO);
        assert_eq!(amount_or_zero(Some(" 1250.50 ")), dec!(1250.50));
    }

    #[test]
    fn registration_is_excluded_from_the_pool() {
        let totals = MeetingTotals {
            savings: dec!(1000),
            loan_repayments: dec!(5000),
            fines: dec!(200),
            social_fund: dec!(300),
            registration: dec!(400),
            attendance_count: 3,
            grand_total: dec!(6900),
        };
        assert_eq!(totals.pool_amount(), dec!(6500));
    }
}

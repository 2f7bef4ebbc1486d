use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::LoanId;

/// A single loan's share of one meeting's pooled collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AllocationSlice {
    pub loan: LoanId,
    pub applied: Decimal,
}

/// Result of running the waterfall over a meeting's pool.
///
/// Slices appear in priority order; loans reached after the pool ran dry
/// carry no slice and are treated as zero.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocationPlan {
    pub pool: Decimal,
    pub slices: Vec<AllocationSlice>,
    pub to_savings: Decimal,
}

impl AllocationPlan {
    pub fn applied_total(&self) -> Decimal {
        self.slices.iter().map(|slice| slice.applied).sum()
    }

    /// Amount this plan applies to a given loan (zero when unlisted).
    pub fn applied_for(&self, loan: LoanId) -> Decimal {
        self.slices
            .iter()
            .find(|slice| slice.loan == loan)
            .map(|slice| slice.applied)
            .unwrap_or(Decimal::ZERO)
    }

    /// Conservation check: applied plus remainder must equal the pool.
    pub fn balances(&self) -> bool {
        self.applied_total() + self.to_savings == self.pool
    }
}

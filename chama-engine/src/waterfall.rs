use chama_core::{AllocationPlan, AllocationSlice, GroupLoan};
use rust_decimal::Decimal;

use crate::{EngineError, EngineResult};

/// Distribute a pooled collection across outstanding group loans.
///
/// Strict waterfall: each loan absorbs up to its own outstanding balance
/// in priority order (callers supply loans oldest-approved-first), and
/// whatever no loan can absorb becomes the group-savings remainder. The
/// input loans are never mutated, so plans can be computed speculatively;
/// applying the decrements is the coordinator's job.
pub fn allocate(pool: Decimal, loans: &[GroupLoan]) -> EngineResult<AllocationPlan> {
    if pool < Decimal::ZERO {
        return Err(EngineError::NegativePool { pool });
    }

    let mut remaining = pool;
    let mut slices = Vec::new();
    for loan in loans {
        if remaining.is_zero() {
            break;
        }
        if !loan.is_outstanding() {
            continue;
        }
        let applied = remaining.min(loan.outstanding_balance);
        slices.push(AllocationSlice {
            loan: loan.id,
            applied,
        });
        remaining -= applied;
    }

    let plan = AllocationPlan {
        pool,
        slices,
        to_savings: remaining,
    };
    if !plan.balances() {
        return Err(EngineError::AllocationOverrun {
            pool,
            applied: plan.applied_total(),
            to_savings: plan.to_savings,
        });
    }
    Ok(plan)
}

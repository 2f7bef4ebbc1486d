use chama_core::{FineSchedule, MemberLoan};
use rust_decimal::Decimal;

use crate::{EngineError, EngineResult};

/// A member's scheduled payment for one weekly meeting.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Obligation {
    pub weekly_repayment: Decimal,
    pub fines: Decimal,
    pub total_payment: Decimal,
}

impl Obligation {
    /// The all-zero obligation of a member without a serviceable loan.
    pub const fn none() -> Self {
        Self {
            weekly_repayment: Decimal::ZERO,
            fines: Decimal::ZERO,
            total_payment: Decimal::ZERO,
        }
    }
}

/// Compute one member's weekly obligation from a loan snapshot.
///
/// The installment is exact rational division of principal by schedule
/// length; rounding to the ledger unit happens only when the amount is
/// persisted, so error never compounds across weeks. Members without an
/// active or overdue loan owe nothing, fines included.
pub fn weekly_obligation(
    loan: Option<&MemberLoan>,
    is_absent: bool,
    fines: &FineSchedule,
) -> EngineResult<Obligation> {
    let Some(loan) = loan.filter(|loan| loan.is_payable()) else {
        return Ok(Obligation::none());
    };
    if loan.weeks_due == 0 {
        return Err(EngineError::InvalidSchedule { loan: loan.id });
    }

    let weekly_repayment = loan.principal / Decimal::from(loan.weeks_due);
    let mut fine_total = Decimal::ZERO;
    if is_absent {
        fine_total += fines.absence_fine;
    }
    if loan.days_overdue > fines.overdue_grace_days {
        // Penalty accrues on the current outstanding balance, not principal.
        fine_total += loan.remaining_balance * fines.overdue_penalty_rate;
    }

    Ok(Obligation {
        weekly_repayment,
        fines: fine_total,
        total_payment: weekly_repayment + fine_total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chama_core::{LoanId, MemberId, MemberLoanStatus};
    use rust_decimal_macros::dec;

    fn sample_loan(days_overdue: u32) -> MemberLoan {
        MemberLoan {
            id: LoanId::new(),
            member: MemberId::new(),
            principal: dec!(100000),
            remaining_balance: dec!(80000),
            weeks_due: 20,
            weeks_paid: 4,
            status: MemberLoanStatus::Active,
            days_overdue,
        }
    }

    #[test]
    fn present_member_within_grace_owes_the_installment_only() {
        let loan = sample_loan(0);
        let obligation = weekly_obligation(Some(&loan), false, &FineSchedule::default()).unwrap();
        assert_eq!(obligation.weekly_repayment, dec!(5000));
        assert_eq!(obligation.fines, dec!(0));
        assert_eq!(obligation.total_payment, dec!(5000));
    }

    #[test]
    fn overdue_balance_draws_a_one_percent_penalty() {
        let loan = sample_loan(10);
        let obligation = weekly_obligation(Some(&loan), false, &FineSchedule::default()).unwrap();
        assert_eq!(obligation.weekly_repayment, dec!(5000));
        assert_eq!(obligation.fines, dec!(800));
        assert_eq!(obligation.total_payment, dec!(5800));
    }

    #[test]
    fn absence_adds_the_flat_fine_on_top() {
        let loan = sample_loan(10);
        let obligation = weekly_obligation(Some(&loan), true, &FineSchedule::default()).unwrap();
        assert_eq!(obligation.fines, dec!(2400));
        assert_eq!(obligation.total_payment, dec!(7400));
    }

    #[test]
    fn seven_days_overdue_is_still_inside_grace() {
        let mut loan = sample_loan(7);
        loan.remaining_balance = dec!(50000);
        let obligation = weekly_obligation(Some(&loan), false, &FineSchedule::default()).unwrap();
        assert_eq!(obligation.fines, dec!(0));
    }

    #[test]
    fn member_without_a_loan_owes_nothing_even_when_absent() {
        let obligation = weekly_obligation(None, true, &FineSchedule::default()).unwrap();
        assert_eq!(obligation, Obligation::none());
    }

    #[test]
    fn repaid_loan_behaves_like_no_loan() {
        let mut loan = sample_loan(0);
        loan.status = MemberLoanStatus::Repaid;
        loan.remaining_balance = Decimal::ZERO;
        let obligation = weekly_obligation(Some(&loan), true, &FineSchedule::default()).unwrap();
        assert_eq!(obligation, Obligation::none());
    }

    #[test]
    fn zero_week_schedule_is_rejected() {
        let mut loan = sample_loan(0);
        loan.weeks_due = 0;
        let err = weekly_obligation(Some(&loan), false, &FineSchedule::default()).unwrap_err();
        assert_eq!(err, EngineError::InvalidSchedule { loan: loan.id });
    }

    #[test]
    fn installment_division_stays_exact() {
        let mut loan = sample_loan(0);
        loan.principal = dec!(100000);
        loan.weeks_due = 3;
        let obligation = weekly_obligation(Some(&loan), false, &FineSchedule::default()).unwrap();
        // The installment keeps its fractional part; rounding is deferred
        // to the persistence boundary.
        assert!(!obligation.weekly_repayment.fract().is_zero());
        assert!(obligation.weekly_repayment > dec!(33333));
        assert!(obligation.weekly_repayment < dec!(33334));
    }
}

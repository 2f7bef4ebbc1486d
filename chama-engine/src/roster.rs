use std::collections::HashMap;

use chama_core::{round_to_unit, CollectionEntry, FineSchedule, LoanId, MemberId, MemberLoan};
use rust_decimal::Decimal;

use crate::{weekly_obligation, EngineError};

/// Raw facilitator input for one member, before obligations are derived.
#[derive(Clone, Debug, PartialEq)]
pub struct RosterRow {
    pub member: MemberId,
    pub savings: Decimal,
    pub social_fund: Decimal,
    pub registration: Decimal,
    pub is_absent: bool,
    /// Facilitator override for the derived repayment, e.g. zeroed when
    /// an absent member sent no money along.
    pub repayment_override: Option<Decimal>,
    /// Facilitator override for the derived fines.
    pub fine_override: Option<Decimal>,
}

impl RosterRow {
    /// A present member with nothing collected yet.
    pub fn present(member: MemberId) -> Self {
        Self {
            member,
            savings: Decimal::ZERO,
            social_fund: Decimal::ZERO,
            registration: Decimal::ZERO,
            is_absent: false,
            repayment_override: None,
            fine_override: None,
        }
    }

    pub fn absent(member: MemberId) -> Self {
        Self {
            is_absent: true,
            ..Self::present(member)
        }
    }
}

/// A member whose loan schedule could not produce an obligation.
#[derive(Clone, Debug, PartialEq)]
pub struct ScheduleFault {
    pub member: MemberId,
    pub loan: LoanId,
    pub error: EngineError,
}

/// Derive collection entries from raw roster inputs and loan snapshots.
///
/// Amounts are rounded to the ledger unit here: this is where figures
/// become cash actually collected, and keeping every downstream sum on
/// already-rounded values keeps plan conservation exact. A row whose loan
/// fails schedule validation keeps its savings, social fund, and
/// attendance but drops all loan-related amounts; the fault is reported
/// alongside for the caller to log.
pub fn build_entries(
    roster: &[RosterRow],
    loans: &HashMap<MemberId, MemberLoan>,
    fines: &FineSchedule,
    unit_scale: u32,
) -> (Vec<CollectionEntry>, Vec<ScheduleFault>) {
    let mut entries = Vec::with_capacity(roster.len());
    let mut faults = Vec::new();

    for row in roster {
        let loan = loans.get(&row.member).filter(|loan| loan.is_payable());
        let (obligation, loan) = match weekly_obligation(loan, row.is_absent, fines) {
            Ok(obligation) => (obligation, loan),
            Err(error) => {
                if let EngineError::InvalidSchedule { loan } = error {
                    faults.push(ScheduleFault {
                        member: row.member,
                        loan,
                        error,
                    });
                }
                (crate::Obligation::none(), None)
            }
        };

        let repayment = row
            .repayment_override
            .unwrap_or(obligation.weekly_repayment)
            .max(Decimal::ZERO);
        // Never collect past the remaining balance; the final installment
        // is usually smaller than the scheduled one.
        let repayment = match loan {
            Some(loan) => repayment.min(loan.remaining_balance),
            None => Decimal::ZERO,
        };
        let fines_due = row
            .fine_override
            .unwrap_or(obligation.fines)
            .max(Decimal::ZERO);

        entries.push(CollectionEntry {
            member: row.member,
            savings: round_to_unit(row.savings.max(Decimal::ZERO), unit_scale),
            loan_repayment: round_to_unit(repayment, unit_scale),
            fines: round_to_unit(fines_due, unit_scale),
            social_fund: round_to_unit(row.social_fund.max(Decimal::ZERO), unit_scale),
            registration: round_to_unit(row.registration.max(Decimal::ZERO), unit_scale),
            is_absent: row.is_absent,
            loan: loan.map(|loan| loan.id),
        });
    }

    (entries, faults)
}

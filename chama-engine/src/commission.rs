use chama_core::{CollectionEntry, CommissionPolicy};
use rust_decimal::Decimal;

/// Facilitator commission derived from loan-processing activity in one
/// submission batch. A derived value only; it never touches balances.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Commission {
    pub loan_count: u32,
    pub fee_total: Decimal,
    pub amount: Decimal,
}

/// Derive commission from the members who carried a serviceable loan
/// into the meeting.
pub fn commission_for(entries: &[CollectionEntry], policy: &CommissionPolicy) -> Commission {
    let loan_count = entries.iter().filter(|entry| entry.has_loan()).count() as u32;
    let fee_total = Decimal::from(loan_count) * policy.processing_fee_per_loan;
    Commission {
        loan_count,
        fee_total,
        amount: fee_total * policy.commission_rate,
    }
}

use chama_core::{CollectionEntry, MeetingTotals};

/// Sum a meeting's collection entries into category totals.
///
/// A plain commutative fold: the result is identical under any row
/// ordering. Absence semantics live upstream in the roster builder; this
/// stage only sums what it is given and counts present members.
pub fn aggregate(entries: &[CollectionEntry]) -> MeetingTotals {
    let mut totals = MeetingTotals::default();
    for entry in entries {
        totals.savings += entry.savings;
        totals.loan_repayments += entry.loan_repayment;
        totals.fines += entry.fines;
        totals.social_fund += entry.social_fund;
        totals.registration += entry.registration;
        if !entry.is_absent {
            totals.attendance_count += 1;
        }
    }
    totals.grand_total = totals.savings
        + totals.loan_repayments
        + totals.fines
        + totals.social_fund
        + totals.registration;
    totals
}

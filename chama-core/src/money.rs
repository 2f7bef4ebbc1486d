use rust_decimal::{Decimal, RoundingStrategy};

/// Round an amount to the ledger's minimum currency unit.
///
/// Applied only at the persistence boundary; intermediate obligations
/// keep full precision so rounding error never compounds across weeks.
pub fn round_to_unit(amount: Decimal, unit_scale: u32) -> Decimal {
    amount.round_dp_with_strategy(unit_scale, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rounds_to_whole_units() {
        assert_eq!(round_to_unit(dec!(5000.4), 0), dec!(5000));
        assert_eq!(round_to_unit(dec!(5000.5), 0), dec!(5001));
        assert_eq!(round_to_unit(dec!(3333.333333), 0), dec!(3333));
    }

    #[test]
    fn respects_the_configured_scale() {
        assert_eq!(round_to_unit(dec!(12.3456), 2), dec!(12.35));
    }
}

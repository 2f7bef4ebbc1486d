use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fine and penalty parameters applied by the obligation calculator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FineSchedule {
    /// Flat fine charged when a loan-carrying member misses a meeting.
    pub absence_fine: Decimal,
    /// Penalty rate applied to the current outstanding balance once a
    /// loan is past the grace period.
    pub overdue_penalty_rate: Decimal,
    pub overdue_grace_days: u32,
}

impl Default for FineSchedule {
    fn default() -> Self {
        Self {
            absence_fine: Decimal::new(1600, 0),
            overdue_penalty_rate: Decimal::new(1, 2),
            overdue_grace_days: 7,
        }
    }
}

/// Facilitator compensation parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommissionPolicy {
    pub processing_fee_per_loan: Decimal,
    pub commission_rate: Decimal,
}

impl Default for CommissionPolicy {
    fn default() -> Self {
        Self {
            processing_fee_per_loan: Decimal::new(2000, 0),
            commission_rate: Decimal::new(10, 2),
        }
    }
}

/// Bounded retry/backoff parameters for transient store failures and
/// allocation conflicts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff_ms: 50,
            max_backoff_ms: 2_000,
        }
    }
}

impl RetryPolicy {
    /// Delay before the given retry attempt (1-based), doubling up to the
    /// configured ceiling.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let millis = self
            .base_backoff_ms
            .saturating_mul(1u64 << exponent)
            .min(self.max_backoff_ms);
        Duration::from_millis(millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn default_fines_match_the_field_manual() {
        let fines = FineSchedule::default();
        assert_eq!(fines.absence_fine, dec!(1600));
        assert_eq!(fines.overdue_penalty_rate, dec!(0.01));
        assert_eq!(fines.overdue_grace_days, 7);
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let retry = RetryPolicy {
            max_attempts: 5,
            base_backoff_ms: 100,
            max_backoff_ms: 350,
        };
        assert_eq!(retry.backoff(1), Duration::from_millis(100));
        assert_eq!(retry.backoff(2), Duration::from_millis(200));
        assert_eq!(retry.backoff(3), Duration::from_millis(350));
        assert_eq!(retry.backoff(4), Duration::from_millis(350));
    }
}

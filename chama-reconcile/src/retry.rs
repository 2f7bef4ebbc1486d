use std::thread;

use tracing::warn;

use chama_core::RetryPolicy;
use chama_ledger::{StoreError, StoreResult};

/// Run an idempotent store operation, retrying transient unavailability
/// with bounded exponential backoff. Conflicts and every other error pass
/// straight through; they need recomputation, not repetition.
pub(crate) fn with_retry<T>(
    policy: &RetryPolicy,
    mut op: impl FnMut() -> StoreResult<T>,
) -> StoreResult<T> {
    let mut attempt = 0;
    loop {
        match op() {
            Err(StoreError::Unavailable(reason)) if attempt + 1 < policy.max_attempts.max(1) => {
                attempt += 1;
                let delay = policy.backoff(attempt);
                warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    %reason,
                    "ledger store unavailable, retrying"
                );
                thread::sleep(delay);
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_backoff_ms: 0,
            max_backoff_ms: 0,
        }
    }

    #[test]
    fn transient_failures_are_retried_until_success() {
        let calls = Cell::new(0u32);
        let result = with_retry(&policy(3), || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(StoreError::Unavailable("flaky".into()))
            } else {
                Ok(calls.get())
            }
        });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn attempts_are_bounded() {
        let calls = Cell::new(0u32);
        let result: StoreResult<()> = with_retry(&policy(3), || {
            calls.set(calls.get() + 1);
            Err(StoreError::Unavailable("down".into()))
        });
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn conflicts_pass_through_without_retry() {
        let calls = Cell::new(0u32);
        let result: StoreResult<()> = with_retry(&policy(5), || {
            calls.set(calls.get() + 1);
            Err(StoreError::Conflict {
                entity: "group loan".into(),
                expected: rust_decimal::Decimal::ZERO,
                found: rust_decimal::Decimal::ONE,
            })
        });
        assert!(matches!(result, Err(StoreError::Conflict { .. })));
        assert_eq!(calls.get(), 1);
    }
}

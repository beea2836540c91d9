//! Exponential backoff with jitter.

use super::policy::RetryPolicy;
use std::time::Duration;

/// Upper bound of the jitter, as a fraction of the capped delay.
pub const JITTER_FACTOR: f64 = 0.25;

/// Calculate the backoff delay after attempt `attempt` (zero-based) failed.
///
/// # Mathematical Formula
///
/// ```text
/// raw    = initial_delay * exponential_base ^ attempt
/// capped = min(raw, max_delay)
/// delay  = capped + capped * 0.25 * U      U ~ uniform [0, 1), jitter only
/// ```
///
/// Without jitter the result is deterministic. With jitter it lies in
/// `[capped, capped * 1.25)`. The function has no side effects and never
/// sleeps.
///
/// # Examples
///
/// ```rust
/// use backstop_core::retry::{RetryPolicy, calculate_delay};
/// use std::time::Duration;
///
/// let policy = RetryPolicy::builder()
///     .initial_delay(Duration::from_secs(1))
///     .max_delay(Duration::from_secs(10))
///     .jitter(false)
///     .build()?;
///
/// assert_eq!(calculate_delay(0, &policy), Duration::from_secs(1));
/// assert_eq!(calculate_delay(3, &policy), Duration::from_secs(8));
/// assert_eq!(calculate_delay(10, &policy), Duration::from_secs(10));
/// # Ok::<(), backstop_core::ConfigError>(())
/// ```
pub fn calculate_delay(attempt: u32, policy: &RetryPolicy) -> Duration {
    let capped = capped_delay_secs(attempt, policy);

    let delay = if policy.jitter() {
        capped + capped * JITTER_FACTOR * rand::random::<f64>()
    } else {
        capped
    };

    Duration::try_from_secs_f64(delay).unwrap_or(Duration::MAX)
}

/// The non-jittered delay in seconds, `min(initial * base^attempt, max)`.
fn capped_delay_secs(attempt: u32, policy: &RetryPolicy) -> f64 {
    let max = policy.max_delay().as_secs_f64();
    let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
    let raw = policy.initial_delay().as_secs_f64() * policy.exponential_base().powi(exponent);

    // Huge attempt counts overflow to infinity, which `min` caps. A zero
    // initial delay then gives `0 * inf = NaN` and must stay zero.
    if raw.is_nan() { 0.0 } else { raw.min(max) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(initial: f64, base: f64, max: f64, jitter: bool) -> RetryPolicy {
        RetryPolicy::new(3, initial, max, base, jitter).unwrap()
    }

    #[test]
    fn test_exponential_backoff_calculation() {
        let policy = policy(1.0, 2.0, 60.0, false);

        assert_eq!(calculate_delay(0, &policy), Duration::from_secs(1));
        assert_eq!(calculate_delay(1, &policy), Duration::from_secs(2));
        assert_eq!(calculate_delay(2, &policy), Duration::from_secs(4));
        assert_eq!(calculate_delay(3, &policy), Duration::from_secs(8));
    }

    #[test]
    fn test_max_delay_cap() {
        let policy = policy(1.0, 2.0, 10.0, false);

        // 1024s without the cap
        assert_eq!(calculate_delay(10, &policy), Duration::from_secs(10));
    }

    #[test]
    fn test_huge_attempt_does_not_overflow() {
        let policy = policy(1.0, 10.0, 30.0, false);

        assert_eq!(calculate_delay(u32::MAX, &policy), Duration::from_secs(30));
        assert_eq!(calculate_delay(400, &policy), Duration::from_secs(30));
    }

    #[test]
    fn test_jitter_stays_within_quarter() {
        let policy = policy(4.0, 2.0, 60.0, true);
        let base = Duration::from_secs(8);

        let delays: Vec<Duration> = (0..50).map(|_| calculate_delay(1, &policy)).collect();
        for delay in &delays {
            assert!(
                *delay >= base && *delay < base.mul_f64(1.25),
                "Delay {:?} outside [8s, 10s)",
                delay
            );
        }

        let all_same = delays.windows(2).all(|w| w[0] == w[1]);
        assert!(!all_same, "With jitter, delays should vary");
    }

    #[test]
    fn test_zero_initial_delay_never_sleeps() {
        let policy = RetryPolicy::disabled();
        assert_eq!(calculate_delay(0, &policy), Duration::ZERO);

        let jittered = RetryPolicy::new(5, 0.0, 60.0, 2.0, true).unwrap();
        assert_eq!(calculate_delay(5, &jittered), Duration::ZERO);

        // base^attempt overflows to infinity here
        let long_running = RetryPolicy::new(2000, 0.0, 60.0, 2.0, false).unwrap();
        assert_eq!(calculate_delay(1100, &long_running), Duration::ZERO);
        assert_eq!(calculate_delay(u32::MAX, &jittered), Duration::ZERO);
    }

    #[test]
    fn test_base_one_is_constant() {
        let policy = policy(0.5, 1.0, 60.0, false);
        for attempt in 0..10 {
            assert_eq!(calculate_delay(attempt, &policy), Duration::from_millis(500));
        }
    }
}

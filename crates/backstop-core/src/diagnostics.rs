//! Diagnostics sink for retry sessions.
//!
//! The executors report what they decide through a [`RetryListener`] instead
//! of a global logger. [`TracingListener`] is the default and turns every
//! notification into a structured `tracing` event. Nothing in the engine
//! depends on what a listener does with the notifications.

use std::time::Duration;
use tracing::{error, info, warn};

/// A retry decision: attempt `attempt` failed and another one follows after
/// `delay`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryEvent<'a> {
    /// Name the caller gave the operation
    pub operation_name: &'a str,
    /// The attempt that failed (1-based)
    pub attempt: u32,
    /// Total attempts the policy allows
    pub max_attempts: u32,
    /// Display text of the error that triggered the retry
    pub error: String,
    /// Backoff before the next attempt
    pub delay: Duration,
}

/// Receives notifications from the retry executors.
///
/// All methods default to doing nothing, so implementors only override what
/// they care about.
pub trait RetryListener: Send + Sync {
    /// A retryable failure occurred and the executor is about to back off.
    fn on_retry(&self, event: &RetryEvent<'_>) {
        let _ = event;
    }

    /// The operation succeeded after `retries` failed attempts (`retries > 0`).
    fn on_recovered(&self, operation_name: &str, retries: u32) {
        let _ = (operation_name, retries);
    }

    /// The retry budget ran out; `error` is the last error, which is
    /// returned to the caller.
    fn on_exhausted(&self, operation_name: &str, max_retries: u32, error: &str) {
        let _ = (operation_name, max_retries, error);
    }

    /// A non-retryable error stopped the session.
    fn on_non_retryable(&self, operation_name: &str, error: &str) {
        let _ = (operation_name, error);
    }
}

/// Listener that logs through `tracing`.
///
/// - retry decision: `warn`
/// - non-retryable failure: `warn`
/// - retries exhausted: `error`
/// - success after retries: `info`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingListener;

impl RetryListener for TracingListener {
    fn on_retry(&self, event: &RetryEvent<'_>) {
        warn!(
            operation = %event.operation_name,
            attempt = event.attempt,
            max_attempts = event.max_attempts,
            delay_ms = delay_millis(event.delay),
            error = %event.error,
            "{} failed (attempt {}/{}): {}. Retrying in {:.2} seconds.",
            event.operation_name,
            event.attempt,
            event.max_attempts,
            event.error,
            event.delay.as_secs_f64()
        );
    }

    fn on_recovered(&self, operation_name: &str, retries: u32) {
        info!(
            operation = %operation_name,
            retries,
            "{} succeeded after {} retries",
            operation_name,
            retries
        );
    }

    fn on_exhausted(&self, operation_name: &str, max_retries: u32, error: &str) {
        error!(
            operation = %operation_name,
            max_retries,
            error = %error,
            "{} failed after {} retries. Final error: {}",
            operation_name,
            max_retries,
            error
        );
    }

    fn on_non_retryable(&self, operation_name: &str, error: &str) {
        warn!(
            operation = %operation_name,
            error = %error,
            "{} failed with non-retryable error: {}",
            operation_name,
            error
        );
    }
}

/// Whole milliseconds of `delay`, saturating at `u64::MAX`.
fn delay_millis(delay: Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}

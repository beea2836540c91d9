//! Single-result retry executor.

use super::backoff::calculate_delay;
use super::classify::{StatusCode, is_retryable};
use super::policy::RetryPolicy;
use crate::diagnostics::{RetryEvent, RetryListener, TracingListener};
use std::error::Error;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Operation name used when the caller has nothing more specific.
pub const DEFAULT_OPERATION_NAME: &str = "LLM API call";

/// Runs fallible operations under a [`RetryPolicy`].
///
/// The executor is stateless between calls: every call to
/// [`retry`](Self::retry) or [`retry_stream`](Self::retry_stream) is an
/// independent session with its own attempt counter. One executor can be
/// shared (or cloned) across tasks.
///
/// Invocation is at-least-once: a retried operation may have had side
/// effects on the attempts that failed.
///
/// # Examples
///
/// ```rust
/// use backstop_core::retry::{ApiError, RetryExecutor, RetryPolicy};
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), ApiError> {
/// let policy = RetryPolicy::builder()
///     .max_retries(3)
///     .initial_delay(Duration::from_millis(10))
///     .build()
///     .expect("valid policy");
/// let executor = RetryExecutor::new(policy);
///
/// let calls = AtomicU32::new(0);
/// let answer = executor
///     .retry(
///         || async {
///             if calls.fetch_add(1, Ordering::SeqCst) == 0 {
///                 Err(ApiError::new("quota").with_code(429))
///             } else {
///                 Ok("hello")
///             }
///         },
///         "generate content",
///     )
///     .await?;
///
/// assert_eq!(answer, "hello");
/// assert_eq!(calls.load(Ordering::SeqCst), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    listener: Arc<dyn RetryListener>,
}

impl fmt::Debug for RetryExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl RetryExecutor {
    /// Create an executor that reports through [`TracingListener`].
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            listener: Arc::new(TracingListener),
        }
    }

    /// Replace the diagnostics sink.
    pub fn with_listener(mut self, listener: Arc<dyn RetryListener>) -> Self {
        self.listener = listener;
        self
    }

    /// The policy this executor applies.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Invoke `operation` until it succeeds, fails permanently, or the retry
    /// budget is spent.
    ///
    /// For attempt `0..=max_retries`:
    /// - success returns the value immediately;
    /// - a failure on the last allowed attempt is returned as is;
    /// - a non-retryable failure is returned immediately, without sleeping;
    /// - otherwise the executor sleeps for the backoff delay and tries again.
    ///
    /// The error returned is always the one from the last invocation, never
    /// wrapped. Dropping the returned future cancels the session: no further
    /// attempts are made.
    pub async fn retry<F, Fut, T, E>(&self, mut operation: F, operation_name: &str) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Error + StatusCode + 'static,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => {
                    self.record_success(attempt, operation_name);
                    return Ok(value);
                }
                Err(err) => match self.next_delay(attempt, &err, operation_name) {
                    Some(delay) => {
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => return Err(err),
                },
            }
        }
    }

    pub(crate) fn record_success(&self, attempt: u32, operation_name: &str) {
        if attempt > 0 {
            self.listener.on_recovered(operation_name, attempt);
        }
    }

    /// Decide what follows the failure of `attempt` (zero-based).
    ///
    /// Returns the backoff before the next attempt, or `None` when the
    /// session must stop and surface `error`.
    pub(crate) fn next_delay<E>(&self, attempt: u32, error: &E, operation_name: &str) -> Option<Duration>
    where
        E: Error + StatusCode + 'static,
    {
        if attempt >= self.policy.max_retries() {
            self.listener
                .on_exhausted(operation_name, self.policy.max_retries(), &error.to_string());
            return None;
        }

        if !is_retryable(error) {
            self.listener
                .on_non_retryable(operation_name, &error.to_string());
            return None;
        }

        let delay = calculate_delay(attempt, &self.policy);
        self.listener.on_retry(&RetryEvent {
            operation_name,
            attempt: attempt + 1,
            max_attempts: self.policy.max_attempts(),
            error: error.to_string(),
            delay,
        });
        Some(delay)
    }
}

/// Retry `operation` under `policy`, logging through `tracing`.
///
/// Convenience for `RetryExecutor::new(*policy).retry(operation, operation_name)`.
pub async fn retry<F, Fut, T, E>(operation: F, policy: &RetryPolicy, operation_name: &str) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Error + StatusCode + 'static,
{
    RetryExecutor::new(*policy)
        .retry(operation, operation_name)
        .await
}

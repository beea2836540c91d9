//! Shared helpers for integration tests

#![allow(dead_code)]

use backstop_core::diagnostics::{RetryEvent, RetryListener};
use backstop_core::retry::RetryPolicy;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A notification received by [`RecordingListener`].
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Retry {
        attempt: u32,
        max_attempts: u32,
        error: String,
        delay: Duration,
    },
    Recovered {
        retries: u32,
    },
    Exhausted {
        max_retries: u32,
        error: String,
    },
    NonRetryable {
        error: String,
    },
}

/// Listener that keeps every notification for later assertions.
#[derive(Debug, Default)]
pub struct RecordingListener {
    events: Mutex<Vec<Recorded>>,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Recorded> {
        self.events.lock().unwrap().clone()
    }

    /// Number of backoff sleeps the executor decided on.
    pub fn sleeps(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Recorded::Retry { .. }))
            .count()
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Recorded::Retry { delay, .. } => Some(delay),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: Recorded) {
        self.events.lock().unwrap().push(event);
    }
}

impl RetryListener for RecordingListener {
    fn on_retry(&self, event: &RetryEvent<'_>) {
        self.push(Recorded::Retry {
            attempt: event.attempt,
            max_attempts: event.max_attempts,
            error: event.error.clone(),
            delay: event.delay,
        });
    }

    fn on_recovered(&self, _operation_name: &str, retries: u32) {
        self.push(Recorded::Recovered { retries });
    }

    fn on_exhausted(&self, _operation_name: &str, max_retries: u32, error: &str) {
        self.push(Recorded::Exhausted {
            max_retries,
            error: error.to_string(),
        });
    }

    fn on_non_retryable(&self, _operation_name: &str, error: &str) {
        self.push(Recorded::NonRetryable {
            error: error.to_string(),
        });
    }
}

/// Deterministic policy with small delays: 10ms, 20ms, 40ms, ...
pub fn fast_policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy::builder()
        .max_retries(max_retries)
        .initial_delay(Duration::from_millis(10))
        .max_delay(Duration::from_secs(1))
        .jitter(false)
        .build()
        .expect("valid policy")
}

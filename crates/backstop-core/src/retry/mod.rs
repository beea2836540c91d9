//! Retry policies, backoff, error classification, and the retry executors.
//!
//! # Key Types
//!
//! - [`RetryPolicy`] - Immutable retry configuration
//! - [`calculate_delay`] - Exponential backoff with jitter
//! - [`is_retryable`] / [`StatusCode`] - Transient-error classification
//! - [`RetryExecutor`] - Single-result and streaming retry loops
//!
//! # Examples
//!
//! ```rust
//! use backstop_core::retry::{ApiError, RetryPolicy, retry};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let policy = RetryPolicy::builder()
//!     .max_retries(3)
//!     .initial_delay(Duration::from_millis(100))
//!     .build()?;
//!
//! let result = retry(
//!     || async {
//!         // Your LLM API call here
//!         Ok::<_, ApiError>(42)
//!     },
//!     &policy,
//!     "LLM API call",
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```

mod backoff;
mod classify;
mod executor;
mod policy;
mod stream;

pub use backoff::{JITTER_FACTOR, calculate_delay};
pub use classify::{
    ApiError, RETRYABLE_PATTERNS, RETRYABLE_STATUS_CODES, StatusCode, is_retryable,
    is_transport_failure,
};
pub use executor::{DEFAULT_OPERATION_NAME, RetryExecutor, retry};
pub use policy::{DEFAULT_ENV_PREFIX, RetryPolicy, RetryPolicyBuilder};
pub use stream::{DEFAULT_STREAM_OPERATION_NAME, RetryStream, retry_stream};

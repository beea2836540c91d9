#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Retry-with-backoff engine for calls to external services, typically LLM
//! APIs.
//!
//! This crate decides, per failure, whether to retry, how long to wait, and
//! how to restart a streaming call whose output has already partly reached
//! the caller:
//!
//! - **Policy**: [`RetryPolicy`](retry::RetryPolicy), validated once and
//!   immutable afterwards
//! - **Backoff**: exponential growth, capped, with optional +25% jitter
//! - **Classification**: rate limiting, service unavailability, timeouts
//!   and connection failures are retried, everything else is not
//! - **Executors**: a single-result loop and a streaming loop that restarts
//!   the stream from scratch (already delivered items stay delivered)
//! - **Diagnostics**: an injected [`RetryListener`](diagnostics::RetryListener),
//!   `tracing` by default
//!
//! Attempts within a session are strictly sequential. The only suspension
//! point of the engine itself is the backoff sleep, and dropping the
//! future or stream cancels the session.
//!
//! # Examples
//!
//! ```rust
//! use backstop_core::prelude::*;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let executor = RetryExecutor::new(
//!     RetryPolicy::builder()
//!         .max_retries(3)
//!         .initial_delay(Duration::from_millis(100))
//!         .build()?,
//! );
//!
//! let result = executor
//!     .retry(|| async { Ok::<_, ApiError>(42) }, DEFAULT_OPERATION_NAME)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod diagnostics;
pub mod error;
pub mod retry;

pub use error::{ConfigError, Result};

/// Convenient re-exports of commonly used items.
///
/// Import all core abstractions with:
///
/// ```rust
/// use backstop_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::diagnostics::{RetryEvent, RetryListener, TracingListener};
    pub use crate::error::ConfigError;
    pub use crate::retry::{
        ApiError, DEFAULT_OPERATION_NAME, DEFAULT_STREAM_OPERATION_NAME, RetryExecutor,
        RetryPolicy, RetryPolicyBuilder, RetryStream, StatusCode, calculate_delay, is_retryable,
        retry, retry_stream,
    };
}

//! Streaming retry executor.
//!
//! # Restart semantics
//!
//! A streaming operation may fail after some of its items already reached
//! the consumer. The executor does **not** hold those items back, does not
//! try to resume the failed stream, and does not deduplicate: the retry
//! re-invokes the operation from scratch and forwards everything the new
//! attempt produces. A consumer can therefore observe repeated items across
//! attempt boundaries:
//!
//! ```text
//! attempt 1: "item1", <timeout>
//! attempt 2: "item1", "item2", <end>
//! consumer : "item1", "item1", "item2"
//! ```
//!
//! Streamed responses usually carry no resumption token, so replaying from
//! the start is the only general strategy, and surfacing the repeats keeps
//! data loss or reordering upstream visible. Consumers that cannot tolerate
//! repeats must deduplicate themselves.

use super::classify::StatusCode;
use super::executor::RetryExecutor;
use super::policy::RetryPolicy;
use futures::stream::{BoxStream, Stream, StreamExt};
use pin_project::pin_project;
use std::error::Error;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Operation name used for streaming calls when the caller has nothing more
/// specific.
pub const DEFAULT_STREAM_OPERATION_NAME: &str = "LLM streaming API call";

/// Items of every attempt of a streaming retry session, in delivery order.
///
/// Yields `Ok(item)` for each item produced by any attempt. If the session
/// ends in failure, the last error is yielded once as `Err(error)` and the
/// stream ends. Dropping the stream cancels the session, including any
/// pending backoff.
#[pin_project]
pub struct RetryStream<T, E> {
    #[pin]
    inner: BoxStream<'static, Result<T, E>>,
}

impl<T, E> Stream for RetryStream<T, E> {
    type Item = Result<T, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project().inner.poll_next(cx)
    }
}

/// Per-session state threaded through the stream.
struct Session<F, S> {
    executor: RetryExecutor,
    operation: F,
    operation_name: String,
    attempt: u32,
    current: Option<Pin<Box<S>>>,
    finished: bool,
}

impl RetryExecutor {
    /// Stream the items of `operation`, restarting it from scratch on
    /// retryable failures.
    ///
    /// Each call to `operation` must return a fresh stream. An `Err` item
    /// ends the current attempt, whether or not it produced items first;
    /// the retry decision is the same as for [`retry`](Self::retry) and
    /// uses the session's budget, which partial progress does not reset.
    /// See the [module documentation](super::stream) for the duplication
    /// this implies.
    ///
    /// Nothing runs until the returned stream is first polled.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use backstop_core::retry::{ApiError, RetryExecutor, RetryPolicy};
    /// use futures::{TryStreamExt, stream};
    /// use std::sync::Arc;
    /// use std::sync::atomic::{AtomicU32, Ordering};
    /// use std::time::Duration;
    ///
    /// # async fn example() -> Result<(), ApiError> {
    /// let policy = RetryPolicy::builder()
    ///     .initial_delay(Duration::from_millis(10))
    ///     .build()
    ///     .expect("valid policy");
    /// let calls = Arc::new(AtomicU32::new(0));
    ///
    /// let items: Vec<&str> = RetryExecutor::new(policy)
    ///     .retry_stream(
    ///         move || {
    ///             let first = calls.fetch_add(1, Ordering::SeqCst) == 0;
    ///             let tail = if first {
    ///                 Err(ApiError::new("timeout"))
    ///             } else {
    ///                 Ok("item2")
    ///             };
    ///             stream::iter(vec![Ok("item1"), tail])
    ///         },
    ///         "stream content",
    ///     )
    ///     .try_collect()
    ///     .await?;
    ///
    /// assert_eq!(items, ["item1", "item1", "item2"]);
    /// # Ok(())
    /// # }
    /// ```
    pub fn retry_stream<F, S, T, E>(&self, operation: F, operation_name: &str) -> RetryStream<T, E>
    where
        F: FnMut() -> S + Send + 'static,
        S: Stream<Item = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Error + StatusCode + Send + 'static,
    {
        let session = Session {
            executor: self.clone(),
            operation,
            operation_name: operation_name.to_string(),
            attempt: 0,
            current: None,
            finished: false,
        };

        let inner = futures::stream::unfold(session, |mut session| async move {
            if session.finished {
                return None;
            }

            loop {
                let current = session
                    .current
                    .get_or_insert_with(|| Box::pin((session.operation)()));

                match current.next().await {
                    Some(Ok(item)) => return Some((Ok(item), session)),
                    None => {
                        session
                            .executor
                            .record_success(session.attempt, &session.operation_name);
                        return None;
                    }
                    Some(Err(err)) => {
                        // The failed attempt is abandoned, never resumed.
                        session.current = None;

                        match session.executor.next_delay(
                            session.attempt,
                            &err,
                            &session.operation_name,
                        ) {
                            Some(delay) => {
                                tokio::time::sleep(delay).await;
                                session.attempt += 1;
                            }
                            None => {
                                session.finished = true;
                                return Some((Err(err), session));
                            }
                        }
                    }
                }
            }
        });

        RetryStream {
            inner: inner.fuse().boxed(),
        }
    }
}

/// Stream `operation` with retries under `policy`, logging through
/// `tracing`.
///
/// Convenience for `RetryExecutor::new(*policy).retry_stream(operation, operation_name)`.
pub fn retry_stream<F, S, T, E>(operation: F, policy: &RetryPolicy, operation_name: &str) -> RetryStream<T, E>
where
    F: FnMut() -> S + Send + 'static,
    S: Stream<Item = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Error + StatusCode + Send + 'static,
{
    RetryExecutor::new(*policy).retry_stream(operation, operation_name)
}

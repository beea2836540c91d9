//! Classify operation errors as transient (retryable) or permanent.

use std::error::Error;
use std::fmt;
use std::io;

/// Status codes that always mark an error as retryable.
///
/// 429 is "resource exhausted / too many requests", 503 is "service
/// unavailable".
pub const RETRYABLE_STATUS_CODES: [u16; 2] = [429, 503];

/// Lower-case message fragments that mark an error as retryable.
pub const RETRYABLE_PATTERNS: [&str; 8] = [
    "resource exhausted",
    "too many requests",
    "rate limit exceeded",
    "service unavailable",
    "timeout",
    "connection error",
    "network error",
    "internal server error",
];

/// Capability: an error that may carry a machine-readable status code.
///
/// Errors without a status simply keep the default implementation:
///
/// ```rust
/// use backstop_core::retry::StatusCode;
///
/// #[derive(Debug)]
/// struct ParseFailure;
///
/// impl std::fmt::Display for ParseFailure {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         f.write_str("could not parse response")
///     }
/// }
///
/// impl std::error::Error for ParseFailure {}
/// impl StatusCode for ParseFailure {}
///
/// assert_eq!(ParseFailure.status_code(), None);
/// ```
pub trait StatusCode {
    /// The status code reported by the error, if it has one.
    fn status_code(&self) -> Option<u16> {
        None
    }
}

impl StatusCode for io::Error {}

impl StatusCode for tokio::time::error::Elapsed {}

#[cfg(feature = "reqwest")]
impl StatusCode for reqwest::Error {
    fn status_code(&self) -> Option<u16> {
        self.status().map(|status| status.as_u16())
    }
}

/// Decide whether an operation error is worth retrying.
///
/// Checks run in order and the first match wins:
///
/// 1. the error's [`StatusCode`] is 429 or 503;
/// 2. the lower-cased error message contains one of [`RETRYABLE_PATTERNS`];
/// 3. the error, or any error in its `source()` chain, is a timeout or a
///    connection failure (see [`is_transport_failure`]).
///
/// Everything else is permanent. The function is total: it never panics and
/// always answers.
///
/// # Examples
///
/// ```rust
/// use backstop_core::retry::{ApiError, is_retryable};
///
/// assert!(is_retryable(&ApiError::new("quota").with_code(429)));
/// assert!(is_retryable(&ApiError::new("Service Unavailable, try later")));
/// assert!(!is_retryable(&ApiError::new("bad request").with_code(400)));
/// ```
pub fn is_retryable<E>(error: &E) -> bool
where
    E: Error + StatusCode + 'static,
{
    if let Some(code) = error.status_code()
        && RETRYABLE_STATUS_CODES.contains(&code)
    {
        return true;
    }

    let message = error.to_string().to_lowercase();
    if RETRYABLE_PATTERNS
        .iter()
        .any(|pattern| message.contains(pattern))
    {
        return true;
    }

    is_transport_failure(error)
}

/// Whether `error` or one of its sources is a timeout or a failure to
/// establish or keep a connection.
///
/// Recognized: `tokio::time::error::Elapsed`, `std::io::Error` of kind
/// `TimedOut`, `ConnectionRefused`, `ConnectionReset`, `ConnectionAborted`,
/// `NotConnected` or `BrokenPipe`, and (with the `reqwest` feature) a
/// `reqwest::Error` that reports a timeout or a connect failure.
pub fn is_transport_failure(error: &(dyn Error + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(err) = current {
        if is_transport_failure_shallow(err) {
            return true;
        }
        current = err.source();
    }
    false
}

fn is_transport_failure_shallow(err: &(dyn Error + 'static)) -> bool {
    if err.is::<tokio::time::error::Elapsed>() {
        return true;
    }

    if let Some(io_err) = err.downcast_ref::<io::Error>() {
        return matches!(
            io_err.kind(),
            io::ErrorKind::TimedOut
                | io::ErrorKind::ConnectionRefused
                | io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::NotConnected
                | io::ErrorKind::BrokenPipe
        );
    }

    #[cfg(feature = "reqwest")]
    if let Some(http_err) = err.downcast_ref::<reqwest::Error>() {
        return http_err.is_timeout() || http_err.is_connect();
    }

    false
}

/// A structured error from a remote API: a message plus an optional status
/// code.
///
/// This is the shape most LLM API clients surface. Operations can return it
/// directly or convert their own errors into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// Status code reported by the service, if any
    pub code: Option<u16>,
    /// Human-readable message
    pub message: String,
}

impl ApiError {
    /// Create an error without a status code.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// Attach a status code.
    pub fn with_code(mut self, code: u16) -> Self {
        self.code = Some(code);
        self
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for ApiError {}

impl StatusCode for ApiError {
    fn status_code(&self) -> Option<u16> {
        self.code
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::time::Duration;

    #[derive(Debug)]
    struct Wrapped {
        source: io::Error,
    }

    impl fmt::Display for Wrapped {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("request failed")
        }
    }

    impl Error for Wrapped {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.source)
        }
    }

    impl StatusCode for Wrapped {}

    #[rstest]
    #[case(429)]
    #[case(503)]
    fn test_retryable_codes(#[case] code: u16) {
        let error = ApiError::new("opaque").with_code(code);
        assert!(is_retryable(&error));
    }

    #[rstest]
    #[case(400)]
    #[case(401)]
    #[case(404)]
    #[case(500)]
    fn test_non_retryable_codes(#[case] code: u16) {
        let error = ApiError::new("bad request").with_code(code);
        assert!(!is_retryable(&error));
    }

    #[rstest]
    #[case("resource exhausted")]
    #[case("too many requests")]
    #[case("rate limit exceeded")]
    #[case("service unavailable")]
    #[case("timeout")]
    #[case("connection error")]
    #[case("network error")]
    #[case("internal server error")]
    fn test_retryable_message_patterns(#[case] message: &str) {
        assert!(
            is_retryable(&ApiError::new(message)),
            "Failed for message: {}",
            message
        );
    }

    #[test]
    fn test_message_match_is_case_insensitive_substring() {
        assert!(is_retryable(&ApiError::new("503 UNAVAILABLE: Service Unavailable")));
        assert!(is_retryable(&ApiError::new("Read Timeout while streaming")));
    }

    #[test]
    fn test_message_pattern_wins_over_code() {
        // 500 is not a retryable code, but the message still matches
        let error = ApiError::new("Internal Server Error").with_code(500);
        assert!(is_retryable(&error));
    }

    #[test]
    fn test_non_retryable_message() {
        assert!(!is_retryable(&ApiError::new("Invalid request format")));
    }

    #[rstest]
    #[case(io::ErrorKind::TimedOut)]
    #[case(io::ErrorKind::ConnectionRefused)]
    #[case(io::ErrorKind::ConnectionReset)]
    #[case(io::ErrorKind::ConnectionAborted)]
    #[case(io::ErrorKind::NotConnected)]
    #[case(io::ErrorKind::BrokenPipe)]
    fn test_io_transport_kinds_are_retryable(#[case] kind: io::ErrorKind) {
        let error = io::Error::new(kind, "failed");
        assert!(is_retryable(&error));
    }

    #[test]
    fn test_other_io_errors_not_retryable() {
        let error = io::Error::new(io::ErrorKind::InvalidData, "Invalid value");
        assert!(!is_retryable(&error));

        let error = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        assert!(!is_retryable(&error));
    }

    #[tokio::test]
    async fn test_elapsed_is_retryable() {
        let error = tokio::time::timeout(Duration::from_millis(1), std::future::pending::<()>())
            .await
            .unwrap_err();
        assert!(is_retryable(&error));
    }

    #[test]
    fn test_transport_failure_found_in_source_chain() {
        let error = Wrapped {
            source: io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer"),
        };
        assert!(is_retryable(&error));

        let error = Wrapped {
            source: io::Error::other("disk full"),
        };
        assert!(!is_retryable(&error));
    }
}

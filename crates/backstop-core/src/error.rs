//! Error types for the retry engine.
//!
//! The engine only creates errors for invalid configuration. Errors produced
//! by a retried operation are handed back to the caller untouched, so they
//! never appear here.

use thiserror::Error;

/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// A retry policy could not be constructed.
///
/// Raised at construction time (builder, deserialization, environment
/// loading), never while an operation is being retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A policy field holds a value outside its allowed range.
    #[error("Invalid retry policy field `{field}`: {reason}")]
    InvalidField {
        /// Name of the offending field
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// An environment variable could not be parsed.
    #[error("Invalid value {value:?} for environment variable {var}: {reason}")]
    Env {
        /// Full variable name, prefix included
        var: String,
        /// Raw value read from the environment
        value: String,
        /// Why the value was rejected
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

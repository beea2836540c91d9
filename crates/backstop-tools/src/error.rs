//! Error types for the LLM request tools

use crate::url_context::SUPPORTED_MODELS;
use backstop_core::retry::StatusCode;
use thiserror::Error;

/// Result type alias for tool operations.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Errors raised by tools while preparing a request or fetching content.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The request targets a model the tool cannot be used with.
    #[error(
        "URL context tool is not supported for model {model}. Supported models are: {}",
        SUPPORTED_MODELS.join(", ")
    )]
    UnsupportedModel {
        /// Model named in the request
        model: String,
    },

    /// The server answered with a 4xx or 5xx status.
    #[error("HTTP error occurred: {status} - {body}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// The request never produced a response (connection, timeout, bad URL).
    #[error("Error fetching URL {url}: {source}")]
    Fetch {
        /// URL that was requested
        url: String,
        /// Underlying transport error
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

impl StatusCode for ToolError {
    fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Fetch { source, .. } => source.status().map(|status| status.as_u16()),
            Self::UnsupportedModel { .. } | Self::HttpClient(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backstop_core::retry::is_retryable;

    #[test]
    fn test_unsupported_model_lists_supported_models() {
        let err = ToolError::UnsupportedModel {
            model: "gemini-1.0-pro".to_string(),
        };

        let message = err.to_string();
        assert!(message.starts_with("URL context tool is not supported for model gemini-1.0-pro."));
        for model in SUPPORTED_MODELS {
            assert!(message.contains(model));
        }
        assert_eq!(err.status_code(), None);
    }

    #[test]
    fn test_http_error_classification() {
        let throttled = ToolError::Http {
            status: 429,
            body: String::new(),
        };
        assert_eq!(throttled.to_string(), "HTTP error occurred: 429 - ");
        assert_eq!(throttled.status_code(), Some(429));
        assert!(is_retryable(&throttled));

        let missing = ToolError::Http {
            status: 404,
            body: "Not Found".to_string(),
        };
        assert_eq!(missing.to_string(), "HTTP error occurred: 404 - Not Found");
        assert!(!is_retryable(&missing));
    }
}

//! Webpage retrieval over HTTP.

use crate::error::{Result, ToolError};
use crate::tool::BaseTool;
use async_trait::async_trait;
use backstop_core::retry::{RetryExecutor, RetryPolicy};
use std::time::Duration;
use tracing::{debug, warn};

/// User agent sent with every request.
pub const USER_AGENT: &str = "Backstop-WebpageRetrieverTool/0.1";

/// Per-request timeout used by [`WebpageRetrieverTool::new`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Operation name reported to retry diagnostics.
pub const FETCH_OPERATION_NAME: &str = "webpage fetch";

const MAX_REDIRECTS: usize = 10;

/// Fetches the text content of a URL.
///
/// Redirects are followed. By default each fetch is a single attempt; call
/// [`with_retry`](Self::with_retry) to retry throttling, unavailability and
/// transport failures.
///
/// # Examples
///
/// ```rust,no_run
/// use backstop_core::retry::RetryPolicy;
/// use backstop_tools::WebpageRetrieverTool;
///
/// # async fn example() -> backstop_tools::Result<()> {
/// let tool = WebpageRetrieverTool::new()?.with_retry(RetryPolicy::default());
/// let html = tool.fetch("https://example.com").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct WebpageRetrieverTool {
    client: reqwest::Client,
    retry: Option<RetryExecutor>,
}

impl WebpageRetrieverTool {
    /// Create a retriever with the default 10 second timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a retriever with a custom per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| ToolError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            retry: None,
        })
    }

    /// Route every fetch through a retry executor using `policy`.
    pub fn with_retry(self, policy: RetryPolicy) -> Self {
        self.with_executor(RetryExecutor::new(policy))
    }

    /// Route every fetch through `executor`.
    pub fn with_executor(mut self, executor: RetryExecutor) -> Self {
        self.retry = Some(executor);
        self
    }

    /// Fetch `url` and return the response body as text.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        match &self.retry {
            Some(executor) => {
                executor
                    .retry(|| self.fetch_once(url), FETCH_OPERATION_NAME)
                    .await
            }
            None => self.fetch_once(url).await,
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<String> {
        debug!(url, "Fetching webpage");

        let fetch_error = |source| ToolError::Fetch {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(fetch_error)?;
        let status = response.status();

        if status.is_client_error() || status.is_server_error() {
            let body = error_body(url, response.text().await);
            warn!(url, status = status.as_u16(), "Webpage request failed");
            return Err(ToolError::Http {
                status: status.as_u16(),
                body,
            });
        }

        response.text().await.map_err(fetch_error)
    }
}

/// Body of an error response; an unreadable body becomes empty.
fn error_body(url: &str, body: reqwest::Result<String>) -> String {
    body.unwrap_or_else(|e| {
        debug!(url, error = %e, "Could not read error response body");
        String::new()
    })
}

#[async_trait]
impl BaseTool for WebpageRetrieverTool {
    fn name(&self) -> &str {
        "webpage_retriever"
    }

    fn description(&self) -> &str {
        "Fetches content from a URL."
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreadable_error_body_becomes_empty() {
        let failure = reqwest::Client::new()
            .get("invalid_scheme://example.com")
            .send()
            .await
            .unwrap_err();

        assert_eq!(error_body("invalid_scheme://example.com", Err(failure)), "");
        assert_eq!(
            error_body("https://example.com", Ok("Not Found".to_string())),
            "Not Found"
        );
    }
}

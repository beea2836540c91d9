#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Tools that prepare LLM requests or fetch content on the model's behalf.
//!
//! - [`UrlContextTool`] declares the URL context capability on a request
//! - [`WebpageRetrieverTool`] fetches a page over HTTP, optionally under a
//!   `backstop-core` retry policy
//!
//! # Examples
//!
//! ```rust
//! use backstop_tools::{BaseTool, LlmRequest, UrlContextTool};
//!
//! # async fn example() -> backstop_tools::Result<()> {
//! let mut request = LlmRequest::new("gemini-2.0-flash");
//! UrlContextTool::new().process_llm_request(&mut request).await?;
//!
//! assert_eq!(request.tools().len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod request;
pub mod tool;
pub mod url_context;
pub mod webpage;

pub use error::{Result, ToolError};
pub use request::{GenerateContentConfig, GoogleSearch, LlmRequest, ToolDeclaration, UrlContext};
pub use tool::BaseTool;
pub use url_context::{SUPPORTED_MODELS, UrlContextTool};
pub use webpage::WebpageRetrieverTool;

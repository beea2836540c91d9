//! Core tool trait

use crate::error::Result;
use crate::request::LlmRequest;
use async_trait::async_trait;

/// A tool that can be attached to an LLM request.
///
/// Tools get a chance to edit the outgoing request (for example to declare a
/// built-in capability) before it is sent.
#[async_trait]
pub trait BaseTool: Send + Sync {
    /// Unique tool name.
    fn name(&self) -> &str;

    /// Human-readable description of what the tool does.
    fn description(&self) -> &str;

    /// Adjust `request` so the model can use this tool.
    ///
    /// The default implementation leaves the request untouched.
    async fn process_llm_request(&self, request: &mut LlmRequest) -> Result<()> {
        let _ = request;
        Ok(())
    }
}

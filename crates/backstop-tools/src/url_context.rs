//! Built-in URL context tool.

use crate::error::{Result, ToolError};
use crate::request::{LlmRequest, ToolDeclaration};
use crate::tool::BaseTool;
use async_trait::async_trait;
use tracing::debug;

/// Model names that accept the URL context tool.
///
/// A request model matches when it contains one of these names, so
/// `models/gemini-2.0-flash` and `gemini-2.0-flash-001` are accepted too.
pub const SUPPORTED_MODELS: [&str; 4] = [
    "gemini-2.5-pro-preview-05-06",
    "gemini-2.5-flash-preview-05-20",
    "gemini-2.0-flash",
    "gemini-2.0-flash-live-001",
];

/// Lets the model fetch the URLs given in the prompt and use their content
/// as context.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlContextTool;

impl UrlContextTool {
    /// Create the tool.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BaseTool for UrlContextTool {
    fn name(&self) -> &str {
        "url_context"
    }

    fn description(&self) -> &str {
        "Enables the model to use content from provided URLs as context."
    }

    /// Declare URL context on `request`.
    ///
    /// Fails with [`ToolError::UnsupportedModel`] and leaves the request
    /// untouched when its model is not supported. A request without a model
    /// is accepted. The declaration is added at most once.
    async fn process_llm_request(&self, request: &mut LlmRequest) -> Result<()> {
        if let Some(model) = request.model.as_deref()
            && !SUPPORTED_MODELS.iter().any(|supported| model.contains(supported))
        {
            return Err(ToolError::UnsupportedModel {
                model: model.to_string(),
            });
        }

        let tools = request
            .config
            .get_or_insert_with(Default::default)
            .tools
            .get_or_insert_with(Vec::new);

        if tools.iter().any(|tool| tool.url_context.is_some()) {
            debug!(tool = self.name(), "URL context already declared");
        } else {
            tools.push(ToolDeclaration::url_context());
            debug!(tool = self.name(), tools = tools.len(), "Declared URL context");
        }

        Ok(())
    }
}

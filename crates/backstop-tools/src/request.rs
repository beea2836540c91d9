//! Minimal LLM request model that tools can edit before the request is sent.
//!
//! Field names serialize in the camelCase wire format of the Gemini API.

use serde::{Deserialize, Serialize};

/// An outgoing content generation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmRequest {
    /// Target model name, e.g. `gemini-2.0-flash`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Generation settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<GenerateContentConfig>,
}

impl LlmRequest {
    /// Create a request for `model`.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: Some(model.into()),
            config: None,
        }
    }

    /// Declared tools, or an empty slice when none are configured.
    pub fn tools(&self) -> &[ToolDeclaration] {
        self.config
            .as_ref()
            .and_then(|config| config.tools.as_deref())
            .unwrap_or_default()
    }
}

/// Generation settings attached to a request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentConfig {
    /// Tools the model may use
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDeclaration>>,
}

/// One entry of the request's tool list.
///
/// Exactly one field is normally set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDeclaration {
    /// Lets the model read the URLs given in the prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_context: Option<UrlContext>,

    /// Grounds answers with search results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_search: Option<GoogleSearch>,
}

impl ToolDeclaration {
    /// A URL context declaration.
    pub fn url_context() -> Self {
        Self {
            url_context: Some(UrlContext {}),
            ..Default::default()
        }
    }

    /// A search grounding declaration.
    pub fn google_search() -> Self {
        Self {
            google_search: Some(GoogleSearch {}),
            ..Default::default()
        }
    }
}

/// Marker for the URL context built-in tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlContext {}

/// Marker for the search grounding built-in tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleSearch {}

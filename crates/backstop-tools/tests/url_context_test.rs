//! Integration tests for the URL context tool

use backstop_tools::{BaseTool, GenerateContentConfig, LlmRequest, ToolDeclaration, ToolError, UrlContextTool};
use rstest::{fixture, rstest};

#[fixture]
fn supported_request() -> LlmRequest {
    LlmRequest::new("gemini-2.5-flash-preview-05-20")
}

#[test]
fn test_tool_metadata() {
    let tool = UrlContextTool::new();
    assert_eq!(tool.name(), "url_context");
    assert_eq!(
        tool.description(),
        "Enables the model to use content from provided URLs as context."
    );
}

#[rstest]
#[tokio::test]
async fn test_adds_declaration_when_config_is_missing(mut supported_request: LlmRequest) {
    assert!(supported_request.config.is_none());

    UrlContextTool::new()
        .process_llm_request(&mut supported_request)
        .await
        .unwrap();

    assert_eq!(supported_request.tools(), [ToolDeclaration::url_context()]);
}

#[rstest]
#[tokio::test]
async fn test_adds_declaration_when_tools_are_missing(mut supported_request: LlmRequest) {
    supported_request.config = Some(GenerateContentConfig::default());

    UrlContextTool::new()
        .process_llm_request(&mut supported_request)
        .await
        .unwrap();

    assert_eq!(supported_request.tools(), [ToolDeclaration::url_context()]);
}

#[rstest]
#[tokio::test]
async fn test_appends_after_existing_tools(mut supported_request: LlmRequest) {
    supported_request.config = Some(GenerateContentConfig {
        tools: Some(vec![ToolDeclaration::google_search()]),
    });

    UrlContextTool::new()
        .process_llm_request(&mut supported_request)
        .await
        .unwrap();

    assert_eq!(
        supported_request.tools(),
        [ToolDeclaration::google_search(), ToolDeclaration::url_context()]
    );
}

#[rstest]
#[tokio::test]
async fn test_does_not_add_duplicate(mut supported_request: LlmRequest) {
    let tool = UrlContextTool::new();
    tool.process_llm_request(&mut supported_request).await.unwrap();
    tool.process_llm_request(&mut supported_request).await.unwrap();

    assert_eq!(supported_request.tools().len(), 1);
}

#[tokio::test]
async fn test_unsupported_model_is_rejected_without_changes() {
    let mut request = LlmRequest::new("gemini-1.0-pro");

    let err = UrlContextTool::new()
        .process_llm_request(&mut request)
        .await
        .unwrap_err();

    assert!(matches!(err, ToolError::UnsupportedModel { ref model } if model == "gemini-1.0-pro"));
    assert!(
        err.to_string()
            .contains("URL context tool is not supported for model gemini-1.0-pro")
    );
    assert!(request.config.is_none());
}

#[tokio::test]
async fn test_request_without_model_is_accepted() {
    let mut request = LlmRequest::default();

    UrlContextTool::new()
        .process_llm_request(&mut request)
        .await
        .unwrap();

    assert_eq!(request.tools(), [ToolDeclaration::url_context()]);
}

#[rstest]
#[case("gemini-2.5-pro-preview-05-06")]
#[case("gemini-2.0-flash")]
#[case("gemini-2.0-flash-live-001")]
#[case("models/gemini-2.0-flash-001")]
#[tokio::test]
async fn test_supported_model_variants(#[case] model: &str) {
    let mut request = LlmRequest::new(model);

    UrlContextTool::new()
        .process_llm_request(&mut request)
        .await
        .unwrap();

    assert_eq!(request.tools().len(), 1);
}

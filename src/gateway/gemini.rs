//! Gemini API gateway
//!
//! Direct HTTP client for the Gemini `generateContent` endpoint. This is the
//! production [`LlmGateway`] implementation.

use crate::gateway::gemini_types::{
    GeminiApiRequest, GeminiApiResponse, GenerationConfig, RequestContent, RequestPart, Tool,
};
use crate::gateway::{GatewayError, InvokeRequest, LlmGateway, LlmResponse};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Default Gemini REST base URL
pub const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gateway backed by the Gemini REST API
#[derive(Debug, Clone)]
pub struct GeminiGateway {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout_secs: u64,
}

impl GeminiGateway {
    /// Create a gateway for `model` using a shared HTTP client
    pub fn new(
        client: reqwest::Client,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: GEMINI_API_BASE_URL.to_string(),
            timeout_secs,
        }
    }

    /// Point the gateway at a different base URL (used by tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn build_body(request: &InvokeRequest) -> (GeminiApiRequest, bool) {
        let mut prompt = request.prompt.clone();
        let mut generation_config = None;
        let mut tools = Vec::new();
        // Gemini refuses grounding together with a JSON mime type, so a grounded
        // structured call carries its schema in the prompt instead.
        let mut parse_json_from_text = false;

        match (&request.response_json_schema, request.add_context_from_internet) {
            (Some(schema), false) => {
                generation_config = Some(GenerationConfig {
                    response_mime_type: Some("application/json".to_string()),
                    response_json_schema: Some(schema.clone()),
                    ..Default::default()
                });
            }
            (Some(schema), true) => {
                prompt.push_str(&format!(
                    "\n\nRespond ONLY with a JSON object that conforms to this JSON schema:\n{}",
                    schema
                ));
                tools.push(Tool::google_search());
                parse_json_from_text = true;
            }
            (None, true) => tools.push(Tool::google_search()),
            (None, false) => {}
        }

        let body = GeminiApiRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config,
            tools,
        };
        (body, parse_json_from_text)
    }
}

#[async_trait]
impl LlmGateway for GeminiGateway {
    async fn invoke(&self, request: InvokeRequest) -> Result<LlmResponse, GatewayError> {
        let structured = request.response_json_schema.is_some();
        let (body, parse_json_from_text) = Self::build_body(&request);

        tracing::debug!(
            model = %self.model,
            structured = structured,
            grounded = request.add_context_from_internet,
            prompt_len = request.prompt.len(),
            "Calling Gemini API"
        );

        let parsed = generate_content(
            &self.client,
            &self.base_url,
            &self.api_key,
            &self.model,
            &body,
            self.timeout_secs,
        )
        .await?;

        let text = parsed
            .first_text()
            .ok_or_else(|| GatewayError::EmptyResponse("no candidates".to_string()))?;
        if text.trim().is_empty() {
            return Err(GatewayError::EmptyResponse("response text is empty".to_string()));
        }

        tracing::debug!(
            response_len = text.len(),
            "Successfully received response from Gemini API"
        );

        if !structured {
            return Ok(LlmResponse::Text(text));
        }

        let value = if parse_json_from_text {
            extract_json(&text)?
        } else {
            serde_json::from_str(&text).map_err(|e| {
                GatewayError::SchemaViolation(format!("response is not valid JSON: {}", e))
            })?
        };
        Ok(LlmResponse::Structured(value))
    }
}

/// Send one `generateContent` call and decode the envelope
///
/// Shared by the text gateway and the image generator.
pub(crate) async fn generate_content(
    client: &reqwest::Client,
    base_url: &str,
    api_key: &str,
    model: &str,
    body: &GeminiApiRequest,
    timeout_secs: u64,
) -> Result<GeminiApiResponse, GatewayError> {
    if api_key.is_empty() {
        return Err(GatewayError::MissingApiKey);
    }

    let url = format!(
        "{}/models/{}:generateContent?key={}",
        base_url, model, api_key
    );

    let response = client
        .post(&url)
        .timeout(Duration::from_secs(timeout_secs))
        .json(body)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout(timeout_secs)
            } else {
                GatewayError::Transport(e.to_string())
            }
        })?;

    let status = response.status();
    if !status.is_success() {
        let status_code = status.as_u16();
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error body".to_string());

        tracing::error!(
            status_code = status_code,
            error_body = %error_body,
            "Gemini API returned error status"
        );

        if status_code == 429 {
            return Err(GatewayError::RateLimited(error_body));
        }
        return Err(GatewayError::Http {
            status: status_code,
            body: error_body,
        });
    }

    let response_body = response.text().await.map_err(|e| {
        if e.is_timeout() {
            GatewayError::Timeout(timeout_secs)
        } else {
            GatewayError::Transport(e.to_string())
        }
    })?;

    let parsed: GeminiApiResponse = serde_json::from_str(&response_body).map_err(|e| {
        GatewayError::Decode(format!("{} - Response body: {}", e, response_body))
    })?;

    if let Some(reason) = parsed
        .prompt_feedback
        .as_ref()
        .and_then(|feedback| feedback.block_reason.as_ref())
    {
        return Err(GatewayError::Blocked(reason.clone()));
    }

    if parsed.candidates.is_empty() {
        return Err(GatewayError::EmptyResponse("no candidates".to_string()));
    }

    Ok(parsed)
}

/// Pull a JSON object out of a free-text answer
///
/// Accepts bare JSON, JSON wrapped in markdown code fences, or JSON
/// surrounded by prose (first `{` to last `}`).
pub fn extract_json(text: &str) -> Result<Value, GatewayError> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .map(str::trim);
    if let Some(inner) = unfenced {
        if let Ok(value) = serde_json::from_str::<Value>(inner) {
            return Ok(value);
        }
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => {
            serde_json::from_str(&trimmed[start..=end]).map_err(|e| {
                GatewayError::SchemaViolation(format!("response is not valid JSON: {}", e))
            })
        }
        _ => Err(GatewayError::SchemaViolation(
            "response does not contain a JSON object".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use serial_test::serial;

    const MODEL: &str = "gemini-2.5-flash";

    fn gateway(base_url: &str) -> GeminiGateway {
        GeminiGateway::new(reqwest::Client::new(), "test-key", MODEL, 5).with_base_url(base_url)
    }

    fn key_matcher() -> Matcher {
        Matcher::AllOf(vec![Matcher::UrlEncoded("key".into(), "test-key".into())])
    }

    fn text_body(text: &str) -> String {
        json!({
            "candidates": [{
                "content": { "parts": [{ "text": text }], "role": "model" }
            }]
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_invoke_empty_api_key() {
        let gateway = GeminiGateway::new(reqwest::Client::new(), "", MODEL, 5);
        let result = gateway.invoke(InvokeRequest::text("test prompt")).await;
        assert!(matches!(result, Err(GatewayError::MissingApiKey)));
    }

    #[tokio::test]
    #[serial]
    async fn test_invoke_text_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .match_query(key_matcher())
            .match_header("content-type", "application/json")
            .with_status(200)
            .with_body(text_body("This is a test response"))
            .create_async()
            .await;

        let result = gateway(&server.url())
            .invoke(InvokeRequest::text("test prompt"))
            .await;

        mock.assert_async().await;
        assert_eq!(
            result.unwrap(),
            LlmResponse::Text("This is a test response".to_string())
        );
    }

    #[tokio::test]
    #[serial]
    async fn test_invoke_structured_sends_schema() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .match_query(key_matcher())
            .match_body(Matcher::PartialJson(json!({
                "generationConfig": {
                    "responseMimeType": "application/json",
                    "responseJsonSchema": { "type": "object" }
                }
            })))
            .with_status(200)
            .with_body(text_body(r#"{"step": 1, "action": "test"}"#))
            .create_async()
            .await;

        let request = InvokeRequest {
            prompt: "test prompt".to_string(),
            response_json_schema: Some(json!({ "type": "object" })),
            add_context_from_internet: false,
        };
        let result = gateway(&server.url()).invoke(request).await;

        mock.assert_async().await;
        assert_eq!(
            result.unwrap(),
            LlmResponse::Structured(json!({"step": 1, "action": "test"}))
        );
    }

    #[tokio::test]
    #[serial]
    async fn test_invoke_grounded_structured_parses_fenced_json() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .match_query(key_matcher())
            .match_body(Matcher::PartialJson(json!({
                "tools": [{ "googleSearch": {} }]
            })))
            .with_status(200)
            .with_body(text_body("```json\n{\"keywords\": [\"rust\"]}\n```"))
            .create_async()
            .await;

        let request = InvokeRequest {
            prompt: "seo".to_string(),
            response_json_schema: Some(json!({ "type": "object" })),
            add_context_from_internet: true,
        };
        let result = gateway(&server.url()).invoke(request).await;

        mock.assert_async().await;
        assert_eq!(
            result.unwrap(),
            LlmResponse::Structured(json!({"keywords": ["rust"]}))
        );
    }

    #[tokio::test]
    #[serial]
    async fn test_invoke_empty_candidates() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .match_query(key_matcher())
            .with_status(200)
            .with_body(r#"{"candidates": []}"#)
            .create_async()
            .await;

        let result = gateway(&server.url())
            .invoke(InvokeRequest::text("test prompt"))
            .await;

        mock.assert_async().await;
        assert!(matches!(result, Err(GatewayError::EmptyResponse(_))));
    }

    #[tokio::test]
    #[serial]
    async fn test_invoke_blocked_prompt() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .match_query(key_matcher())
            .with_status(200)
            .with_body(r#"{"candidates": [], "promptFeedback": {"blockReason": "SAFETY"}}"#)
            .create_async()
            .await;

        let result = gateway(&server.url())
            .invoke(InvokeRequest::text("test prompt"))
            .await;

        mock.assert_async().await;
        let error_msg = result.unwrap_err().to_string();
        assert!(
            error_msg.contains("blocked the prompt"),
            "Error message should contain 'blocked the prompt', got: {}",
            error_msg
        );
    }

    #[tokio::test]
    #[serial]
    async fn test_invoke_rate_limit() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .match_query(key_matcher())
            .with_status(429)
            .with_body(r#"{"error": "Rate limit exceeded"}"#)
            .create_async()
            .await;

        let result = gateway(&server.url())
            .invoke(InvokeRequest::text("test prompt"))
            .await;

        mock.assert_async().await;
        assert!(matches!(result, Err(GatewayError::RateLimited(_))));
    }

    #[tokio::test]
    #[serial]
    async fn test_invoke_invalid_envelope() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .match_query(key_matcher())
            .with_status(200)
            .with_body("This is not JSON")
            .create_async()
            .await;

        let result = gateway(&server.url())
            .invoke(InvokeRequest::text("test prompt"))
            .await;

        mock.assert_async().await;
        assert!(matches!(result, Err(GatewayError::Decode(_))));
    }

    #[tokio::test]
    #[serial]
    async fn test_structured_call_with_prose_is_schema_violation() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .match_query(key_matcher())
            .with_status(200)
            .with_body(text_body("I think the Business Operations Director fits."))
            .create_async()
            .await;

        let request = InvokeRequest {
            prompt: "route".to_string(),
            response_json_schema: Some(json!({ "type": "object" })),
            add_context_from_internet: false,
        };
        let result = gateway(&server.url()).invoke(request).await;
        assert!(matches!(result, Err(GatewayError::SchemaViolation(_))));
    }

    #[test]
    fn test_extract_json_variants() {
        assert_eq!(extract_json(r#"{"a":1}"#).unwrap(), json!({"a": 1}));
        assert_eq!(
            extract_json("```\n{\"a\":2}\n```").unwrap(),
            json!({"a": 2})
        );
        assert_eq!(
            extract_json("Here you go: {\"a\":3} hope it helps").unwrap(),
            json!({"a": 3})
        );
        assert!(extract_json("no json here").is_err());
    }
}

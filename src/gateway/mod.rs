//! LLM invocation gateway
//!
//! The single abstraction wrapping every call to the external completion
//! provider. Role executors, the router and the synthesis step all go through
//! [`LlmGateway::invoke`]; nothing else talks to the provider.
//!
//! Structured calls carry a JSON schema generated from a typed response
//! contract (see [`Contract`]). [`invoke_typed`] and [`invoke_validated`]
//! check the answer against that contract so callers never handle
//! unvalidated JSON.

pub mod error;
pub mod gemini;
pub mod gemini_types;
pub mod image;
pub mod offline;
pub mod scripted;

pub use error::GatewayError;
pub use gemini::GeminiGateway;
pub use image::{GeminiImageGenerator, GeneratedImage, ImageGenerator, OfflineImageGenerator};
pub use offline::OfflineGateway;
pub use scripted::ScriptedGateway;

use async_trait::async_trait;
use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// A single request to the LLM provider
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InvokeRequest {
    /// Full prompt text
    pub prompt: String,
    /// JSON schema the answer must follow; `None` asks for free text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_json_schema: Option<Value>,
    /// Ask the provider to ground the answer with web search
    pub add_context_from_internet: bool,
}

impl InvokeRequest {
    /// Free-text request
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            response_json_schema: None,
            add_context_from_internet: false,
        }
    }

    /// Structured request whose schema is derived from the contract `T`
    pub fn structured<T: Contract>(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            response_json_schema: Some(schema_for_contract::<T>()),
            add_context_from_internet: false,
        }
    }

    /// Enable or disable internet grounding
    pub fn with_internet_context(mut self, enabled: bool) -> Self {
        self.add_context_from_internet = enabled;
        self
    }
}

/// Answer produced by the gateway
#[derive(Debug, Clone, PartialEq)]
pub enum LlmResponse {
    /// JSON data, returned for requests that carried a schema
    Structured(Value),
    /// Plain text, returned for free-text requests
    Text(String),
}

impl LlmResponse {
    fn shape(&self) -> &'static str {
        match self {
            LlmResponse::Structured(_) => "structured data",
            LlmResponse::Text(_) => "free text",
        }
    }

    /// Take the JSON payload of a structured answer
    pub fn into_structured(self) -> Result<Value, GatewayError> {
        match self {
            LlmResponse::Structured(value) => Ok(value),
            other => Err(GatewayError::UnexpectedShape {
                expected: "structured data",
                actual: other.shape(),
            }),
        }
    }

    /// Take the text of a free-text answer
    pub fn into_text(self) -> Result<String, GatewayError> {
        match self {
            LlmResponse::Text(text) => Ok(text),
            other => Err(GatewayError::UnexpectedShape {
                expected: "free text",
                actual: other.shape(),
            }),
        }
    }
}

/// Abstraction over the external LLM completion service
///
/// Implementations must honour the schema contract: when
/// `response_json_schema` is set they return [`LlmResponse::Structured`]
/// or fail; otherwise they return [`LlmResponse::Text`]. No retries are
/// performed at this layer.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Send one request to the provider
    async fn invoke(&self, request: InvokeRequest) -> Result<LlmResponse, GatewayError>;
}

/// A typed response contract for a structured LLM call
///
/// Blanket-implemented for every type that can describe itself as a JSON
/// schema and be deserialized from the answer.
pub trait Contract: DeserializeOwned + JsonSchema {}

impl<T: DeserializeOwned + JsonSchema> Contract for T {}

/// Generate the JSON schema sent to the provider for contract `T`
///
/// Sub-schemas are inlined and optional fields are simply left out of
/// `required`, which keeps the schema inside the subset providers accept.
pub fn schema_for_contract<T: JsonSchema>() -> Value {
    let settings = SchemaSettings::draft07().with(|s| {
        s.inline_subschemas = true;
        s.option_add_null_type = false;
        s.meta_schema = None;
    });
    let schema = settings.into_generator().into_root_schema_for::<T>();
    let mut value = serde_json::to_value(schema).unwrap_or(Value::Null);
    if let Value::Object(map) = &mut value {
        map.remove("title");
        map.remove("definitions");
    }
    value
}

/// Invoke the gateway and deserialize the answer into contract `T`
pub async fn invoke_typed<T: Contract>(
    gateway: &dyn LlmGateway,
    request: InvokeRequest,
) -> Result<T, GatewayError> {
    let value = gateway.invoke(request).await?.into_structured()?;
    serde_json::from_value(value).map_err(|e| GatewayError::SchemaViolation(e.to_string()))
}

/// Invoke the gateway, check the answer against contract `T`, and return
/// the original JSON unmodified
pub async fn invoke_validated<T: Contract>(
    gateway: &dyn LlmGateway,
    request: InvokeRequest,
) -> Result<Value, GatewayError> {
    let value = gateway.invoke(request).await?.into_structured()?;
    if !value.is_object() {
        return Err(GatewayError::SchemaViolation(format!(
            "expected a JSON object, got: {}",
            value
        )));
    }
    serde_json::from_value::<T>(value.clone())
        .map_err(|e| GatewayError::SchemaViolation(e.to_string()))?;
    Ok(value)
}

/// Invoke the gateway for free text
pub async fn invoke_text(gateway: &dyn LlmGateway, prompt: String) -> Result<String, GatewayError> {
    gateway.invoke(InvokeRequest::text(prompt)).await?.into_text()
}

/// Text gateway and image generator for the configured provider
///
/// Falls back to the offline implementations when offline mode is on or no
/// API key is set.
pub fn from_config(
    config: &crate::config::LlmConfig,
) -> (std::sync::Arc<dyn LlmGateway>, std::sync::Arc<dyn ImageGenerator>) {
    match config.api_key.as_deref() {
        Some(api_key) if !config.use_offline() => {
            let client = reqwest::Client::new();
            tracing::info!(model = %config.model, image_model = %config.image_model, "Using Gemini gateway");
            (
                std::sync::Arc::new(GeminiGateway::new(
                    client.clone(),
                    api_key,
                    &config.model,
                    config.timeout_secs,
                )),
                std::sync::Arc::new(GeminiImageGenerator::new(
                    client,
                    api_key,
                    &config.image_model,
                    config.timeout_secs,
                )),
            )
        }
        _ => {
            tracing::warn!("No Gemini API key or offline mode requested; using offline gateway");
            (
                std::sync::Arc::new(OfflineGateway),
                std::sync::Arc::new(OfflineImageGenerator),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct Sample {
        name: String,
        #[serde(default)]
        tags: Vec<String>,
        score: Option<f64>,
    }

    #[test]
    fn test_schema_marks_only_required_fields() {
        let schema = schema_for_contract::<Sample>();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["name"]));
        assert_eq!(schema["properties"]["tags"]["type"], "array");
        assert_eq!(schema["properties"]["score"]["type"], "number");
        assert!(schema.get("$schema").is_none());
    }

    #[tokio::test]
    async fn test_invoke_typed_rejects_non_conforming_data() {
        let gateway = ScriptedGateway::new();
        gateway.push_json(json!({"tags": ["a"]}));

        let result =
            invoke_typed::<Sample>(&gateway, InvokeRequest::structured::<Sample>("p")).await;
        assert!(matches!(result, Err(GatewayError::SchemaViolation(_))));
    }

    #[tokio::test]
    async fn test_invoke_validated_returns_original_value() {
        let gateway = ScriptedGateway::new();
        let answer = json!({"name": "x", "extra": 1});
        gateway.push_json(answer.clone());

        let value = invoke_validated::<Sample>(&gateway, InvokeRequest::structured::<Sample>("p"))
            .await
            .unwrap();
        assert_eq!(value, answer);
    }

    #[tokio::test]
    async fn test_invoke_text_rejects_structured_answer() {
        let gateway = ScriptedGateway::new();
        gateway.push_json(json!({"name": "x"}));

        let result = invoke_text(&gateway, "p".to_string()).await;
        assert!(matches!(result, Err(GatewayError::UnexpectedShape { .. })));
    }
}

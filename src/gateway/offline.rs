//! Offline gateway for local development
//!
//! Answers without any network access: free-text calls echo the prompt and
//! structured calls get a minimal object shaped after the requested schema.

use crate::gateway::{GatewayError, InvokeRequest, LlmGateway, LlmResponse};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Gateway used when no provider key is configured
#[derive(Debug, Clone, Default)]
pub struct OfflineGateway;

#[async_trait]
impl LlmGateway for OfflineGateway {
    async fn invoke(&self, request: InvokeRequest) -> Result<LlmResponse, GatewayError> {
        match &request.response_json_schema {
            Some(schema) => Ok(LlmResponse::Structured(skeleton(schema))),
            None => Ok(LlmResponse::Text(format!(
                "This is a mock response to: {}",
                request.prompt
            ))),
        }
    }
}

/// Build the smallest value that satisfies `schema`
///
/// Enums take their first variant; objects get every declared property.
pub fn skeleton(schema: &Value) -> Value {
    if let Some(first) = schema
        .get("enum")
        .and_then(Value::as_array)
        .and_then(|variants| variants.first())
    {
        return first.clone();
    }

    let ty = match schema.get("type") {
        Some(Value::String(ty)) => ty.as_str(),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|ty| *ty != "null")
            .unwrap_or("null"),
        _ if schema.get("properties").is_some() => "object",
        _ => "null",
    };

    match ty {
        "object" => {
            let mut object = Map::new();
            if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
                for (name, property) in properties {
                    object.insert(name.clone(), skeleton(property));
                }
            }
            Value::Object(object)
        }
        "array" => Value::Array(Vec::new()),
        "string" => Value::String("mock".to_string()),
        "number" | "integer" => Value::from(0),
        "boolean" => Value::Bool(false),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_skeleton_follows_schema() {
        let schema = json!({
            "type": "object",
            "properties": {
                "primary_director": { "type": "string", "enum": ["Business Operations Director", "Personal Life Director"] },
                "execution_order": { "type": "array", "items": { "type": "string" } },
                "score": { "type": "number" },
                "nested": { "type": "object", "properties": { "flag": { "type": "boolean" } } }
            },
            "required": ["primary_director"]
        });

        assert_eq!(
            skeleton(&schema),
            json!({
                "primary_director": "Business Operations Director",
                "execution_order": [],
                "score": 0,
                "nested": { "flag": false }
            })
        );
    }

    #[tokio::test]
    async fn test_offline_text_echoes_prompt() {
        let answer = OfflineGateway
            .invoke(InvokeRequest::text("hello"))
            .await
            .unwrap();
        assert_eq!(
            answer,
            LlmResponse::Text("This is a mock response to: hello".to_string())
        );
    }
}

//! Request routing
//!
//! One structured call picks the director(s). Any failure of that call
//! (transport, schema, unknown director name) triggers exactly one fallback
//! call with a simplified prompt; if that fails too, routing fails.

use crate::gateway::{invoke_typed, InvokeRequest, LlmGateway};
use crate::orchestrator::prompts::{fallback_prompt, routing_prompt, ConversationTurn};
use crate::orchestrator::utils::hash_request;
use crate::orchestrator::OrchestrationError;
use crate::roles::Director;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

/// Estimated request complexity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum ComplexityLevel {
    Simple,
    Moderate,
    Complex,
    Enterprise,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Which director(s) handle a request, and in what order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RoutingDecision {
    /// Director that owns the request
    pub primary_director: Director,
    /// Other directors that may contribute
    #[serde(default, deserialize_with = "null_as_default")]
    pub supporting_directors: Vec<String>,
    /// Directors to run, in order
    #[serde(default, deserialize_with = "null_as_default")]
    pub execution_order: Vec<Director>,
    /// What the user wants
    #[serde(default)]
    pub user_intent: Option<String>,
    /// Estimated complexity
    #[serde(default)]
    pub complexity_level: Option<ComplexityLevel>,
    /// Estimated completion time
    #[serde(default)]
    pub estimated_time: Option<String>,
}

impl RoutingDecision {
    /// Decision naming only a primary director
    pub fn primary_only(primary_director: Director) -> Self {
        Self {
            primary_director,
            supporting_directors: Vec::new(),
            execution_order: Vec::new(),
            user_intent: None,
            complexity_level: None,
            estimated_time: None,
        }
    }

    /// Directors to run: the execution order, or the primary director alone
    /// when the order is empty
    pub fn execution_order(&self) -> Vec<Director> {
        if self.execution_order.is_empty() {
            vec![self.primary_director]
        } else {
            self.execution_order.clone()
        }
    }

    /// Names of the directors to run, in order
    pub fn assigned_agents(&self) -> Vec<String> {
        self.execution_order()
            .iter()
            .map(|d| d.name().to_string())
            .collect()
    }
}

/// Contract of the fallback routing call
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FallbackRouting {
    /// Director that owns the request
    pub primary_director: Director,
}

/// Route `request` to a director
pub async fn route(
    gateway: &dyn LlmGateway,
    request: &str,
    history: &[ConversationTurn],
) -> Result<RoutingDecision, OrchestrationError> {
    let request_hash = hash_request(request);

    let first = InvokeRequest::structured::<RoutingDecision>(routing_prompt(request, history));
    match invoke_typed::<RoutingDecision>(gateway, first).await {
        Ok(decision) => {
            tracing::info!(
                request_hash = %request_hash,
                primary_director = %decision.primary_director,
                steps = decision.execution_order().len(),
                "Routing decided"
            );
            return Ok(decision);
        }
        Err(e) => {
            tracing::warn!(
                request_hash = %request_hash,
                error = %e,
                "Primary director not identified, engaging fallback"
            );
        }
    }

    let fallback = InvokeRequest::structured::<FallbackRouting>(fallback_prompt(request));
    match invoke_typed::<FallbackRouting>(gateway, fallback).await {
        Ok(FallbackRouting { primary_director }) => {
            tracing::info!(
                request_hash = %request_hash,
                primary_director = %primary_director,
                "Fallback routing decided"
            );
            Ok(RoutingDecision::primary_only(primary_director))
        }
        Err(e) => {
            tracing::error!(request_hash = %request_hash, error = %e, "Routing failed");
            Err(OrchestrationError::RoutingFailed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{GatewayError, ScriptedGateway};
    use serde_json::json;

    #[test]
    fn test_routing_schema_requires_primary_director() {
        let schema = crate::gateway::schema_for_contract::<RoutingDecision>();
        assert_eq!(schema["required"], json!(["primary_director"]));
        assert_eq!(
            schema["properties"]["primary_director"]["enum"]
                .as_array()
                .unwrap()
                .len(),
            6
        );
        assert_eq!(schema["properties"]["complexity_level"]["enum"][3], "enterprise");
    }

    #[tokio::test]
    async fn test_route_first_call_success() {
        let gateway = ScriptedGateway::new();
        gateway.push_json(json!({
            "primary_director": "Creative & Content Director",
            "execution_order": ["Creative & Content Director", "Business Operations Director"],
            "complexity_level": "moderate",
            "supporting_directors": null
        }));

        let decision = route(&gateway, "Launch campaign", &[]).await.unwrap();
        assert_eq!(decision.primary_director, Director::CreativeContent);
        assert_eq!(
            decision.execution_order(),
            vec![Director::CreativeContent, Director::BusinessOperations]
        );
        assert_eq!(decision.complexity_level, Some(ComplexityLevel::Moderate));
        assert_eq!(gateway.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_director_triggers_single_fallback() {
        let gateway = ScriptedGateway::new();
        gateway.push_json(json!({"primary_director": "Chief Vibes Director"}));
        gateway.push_json(json!({"primary_director": "Personal Life Director"}));

        let decision = route(&gateway, "Plan my week", &[]).await.unwrap();
        assert_eq!(decision.primary_director, Director::PersonalLife);
        assert_eq!(decision.execution_order(), vec![Director::PersonalLife]);

        let requests = gateway.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].prompt.starts_with("The user request is: \"Plan my week\""));
        assert_eq!(
            requests[1].response_json_schema.as_ref().unwrap()["required"],
            json!(["primary_director"])
        );
    }

    #[tokio::test]
    async fn test_missing_primary_director_triggers_fallback() {
        let gateway = ScriptedGateway::new();
        gateway.push_json(json!({"execution_order": []}));
        gateway.push_json(json!({"primary_director": "Health & Wellness Director"}));

        let decision = route(&gateway, "Meal plan", &[]).await.unwrap();
        assert_eq!(decision.primary_director, Director::HealthWellness);
    }

    #[tokio::test]
    async fn test_double_failure_is_routing_failed() {
        let gateway = ScriptedGateway::new();
        gateway.push_error(GatewayError::Transport("down".into()));
        gateway.push_json(json!({}));

        let result = route(&gateway, "anything", &[]).await;
        assert!(matches!(result, Err(OrchestrationError::RoutingFailed)));
        assert_eq!(gateway.call_count(), 2);
    }
}

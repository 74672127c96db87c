//! Orchestration engine
//!
//! Route, execute, synthesize. Roles run strictly one after another; role
//! `i` receives the request plus the results of roles `0..i` as context.
//! Any error aborts the run and discards partial results.

use crate::gateway::{invoke_text, LlmGateway};
use crate::orchestrator::constants::ORCHESTRATOR_ACTOR;
use crate::orchestrator::prompts::{synthesis_prompt, ConversationTurn};
use crate::orchestrator::router::{self, RoutingDecision};
use crate::orchestrator::utils::hash_request;
use crate::orchestrator::OrchestrationError;
use crate::roles::{Role, RoleRegistry};
use crate::session::{ActivityLog, ActivityStatus};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, Instrument};

/// Result of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    /// How the request was routed
    pub decision: RoutingDecision,
    /// Roles that ran, in order
    pub assigned_agents: Vec<String>,
    /// Per-role results, in execution order
    pub results: Vec<Value>,
    /// Synthesized reply
    pub reply: String,
}

/// Result of a failed run
#[derive(Debug)]
pub struct RunFailure {
    /// Routing decision, when routing succeeded before the failure
    pub decision: Option<RoutingDecision>,
    /// What went wrong
    pub error: OrchestrationError,
}

impl From<OrchestrationError> for RunFailure {
    fn from(error: OrchestrationError) -> Self {
        Self {
            decision: None,
            error,
        }
    }
}

/// Runs the route / execute / synthesize pipeline
#[derive(Clone)]
pub struct Orchestrator {
    gateway: Arc<dyn LlmGateway>,
    registry: RoleRegistry,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Orchestrator with an explicit registry
    pub fn new(gateway: Arc<dyn LlmGateway>, registry: RoleRegistry) -> Self {
        Self { gateway, registry }
    }

    /// Orchestrator with template executors for every role
    pub fn with_gateway(gateway: Arc<dyn LlmGateway>) -> Self {
        let registry = RoleRegistry::with_gateway(gateway.clone());
        Self::new(gateway, registry)
    }

    /// The gateway used for routing and synthesis
    pub fn gateway(&self) -> &Arc<dyn LlmGateway> {
        &self.gateway
    }

    /// The role registry
    pub fn registry(&self) -> &RoleRegistry {
        &self.registry
    }

    /// Pick the director(s) for `request`
    pub async fn route(
        &self,
        request: &str,
        history: &[ConversationTurn],
    ) -> Result<RoutingDecision, OrchestrationError> {
        router::route(self.gateway.as_ref(), request, history).await
    }

    /// Run every role of the decision in order, accumulating results
    pub async fn execute(
        &self,
        request: &str,
        decision: &RoutingDecision,
        activity: Option<&ActivityLog>,
    ) -> Result<Vec<Value>, OrchestrationError> {
        let mut results: Vec<Value> = Vec::new();

        for director in decision.execution_order() {
            let role = Role::Director(director);
            let executor = self
                .registry
                .get(role)
                .ok_or_else(|| OrchestrationError::UnknownRole(role.name().to_string()))?;

            if let Some(log) = activity {
                log.add(role.name(), "Planning execution", ActivityStatus::Processing);
            }

            let context = Value::Array(results.clone());
            match executor.execute(request, &context).await {
                Ok(result) => {
                    if let Some(log) = activity {
                        log.add(role.name(), "Execution plan ready", ActivityStatus::Completed);
                    }
                    results.push(result);
                }
                Err(e) => {
                    if let Some(log) = activity {
                        log.add(role.name(), format!("Failed: {}", e), ActivityStatus::Failed);
                    }
                    return Err(e.into());
                }
            }
        }

        Ok(results)
    }

    /// Turn the results into one reply
    pub async fn synthesize(
        &self,
        request: &str,
        results: &[Value],
    ) -> Result<String, OrchestrationError> {
        let reply = invoke_text(self.gateway.as_ref(), synthesis_prompt(request, results)).await?;
        Ok(reply)
    }

    /// Full pipeline, recording progress on `activity`
    ///
    /// A failure after routing keeps the decision so callers can still
    /// report which directors were assigned.
    pub async fn run(
        &self,
        request: &str,
        history: &[ConversationTurn],
        activity: &ActivityLog,
    ) -> Result<RunOutcome, RunFailure> {
        let request_hash = hash_request(request);
        let span = tracing::info_span!("orchestration", request_hash = %request_hash);
        self.run_pipeline(request, history, activity)
            .instrument(span)
            .await
    }

    async fn run_pipeline(
        &self,
        request: &str,
        history: &[ConversationTurn],
        activity: &ActivityLog,
    ) -> Result<RunOutcome, RunFailure> {
        let start = Instant::now();

        activity.add(
            ORCHESTRATOR_ACTOR,
            "Analyzing request...",
            ActivityStatus::Processing,
        );
        let decision = self.route(request, history).await?;
        activity.add(
            ORCHESTRATOR_ACTOR,
            format!("Routing to {}", decision.primary_director),
            ActivityStatus::Completed,
        );

        let (results, reply) = match self.execute_and_synthesize(request, &decision, activity).await {
            Ok(finished) => finished,
            Err(error) => {
                return Err(RunFailure {
                    decision: Some(decision),
                    error,
                })
            }
        };

        info!(
            steps = results.len(),
            duration_ms = start.elapsed().as_millis(),
            "Orchestration completed"
        );

        Ok(RunOutcome {
            assigned_agents: decision.assigned_agents(),
            decision,
            results,
            reply,
        })
    }

    async fn execute_and_synthesize(
        &self,
        request: &str,
        decision: &RoutingDecision,
        activity: &ActivityLog,
    ) -> Result<(Vec<Value>, String), OrchestrationError> {
        let results = self.execute(request, decision, Some(activity)).await?;
        let reply = self.synthesize(request, &results).await?;
        Ok((results, reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{GatewayError, ScriptedGateway};
    use crate::roles::{Director, RoleExecutor};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use tokio::sync::broadcast;

    /// Records the context each call receives and answers with its role name
    struct RecordingExecutor {
        role: Role,
        seen: Arc<Mutex<Vec<(String, Value)>>>,
    }

    #[async_trait]
    impl RoleExecutor for RecordingExecutor {
        fn role(&self) -> Role {
            self.role
        }

        async fn execute(&self, _task: &str, context: &Value) -> Result<Value, GatewayError> {
            self.seen
                .lock()
                .unwrap()
                .push((self.role.name().to_string(), context.clone()));
            Ok(json!({ "director_name": self.role.name() }))
        }
    }

    fn log() -> ActivityLog {
        let (sender, _) = broadcast::channel(16);
        ActivityLog::new("test", 20, sender)
    }

    #[tokio::test]
    async fn test_sequential_context_accumulation() {
        let gateway = ScriptedGateway::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut registry = RoleRegistry::new();
        for director in Director::ALL {
            registry.register(Arc::new(RecordingExecutor {
                role: director.into(),
                seen: seen.clone(),
            }));
        }
        let orchestrator = Orchestrator::new(Arc::new(gateway.clone()), registry);

        let mut decision = RoutingDecision::primary_only(Director::BusinessOperations);
        decision.execution_order = vec![
            Director::BusinessOperations,
            Director::CreativeContent,
            Director::FinancialLegal,
        ];
        let results = orchestrator.execute("req", &decision, None).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].0, "Business Operations Director");
        assert_eq!(seen[0].1, json!([]));
        assert_eq!(
            seen[1].1,
            json!([{"director_name": "Business Operations Director"}])
        );
        assert_eq!(seen[2].1, json!([results[0], results[1]]));
        assert_eq!(results.len(), 3);
        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unregistered_role_is_typed_error() {
        let orchestrator =
            Orchestrator::new(Arc::new(ScriptedGateway::new()), RoleRegistry::new());
        let decision = RoutingDecision::primary_only(Director::PersonalLife);

        let result = orchestrator.execute("req", &decision, None).await;
        assert!(matches!(
            result,
            Err(OrchestrationError::UnknownRole(name)) if name == "Personal Life Director"
        ));
    }

    #[tokio::test]
    async fn test_run_happy_path() {
        let gateway = ScriptedGateway::new();
        gateway
            .push_json(json!({"primary_director": "Business Operations Director"}))
            .push_json(json!({
                "director_name": "Business Operations Director",
                "assigned_managers": ["Research Manager", "Project Manager"],
                "execution_steps": [],
                "expected_outcomes": ["Leads in CRM"]
            }))
            .push_text("I found three new leads.");
        let orchestrator = Orchestrator::with_gateway(Arc::new(gateway.clone()));
        let activity = log();

        let outcome = orchestrator
            .run("Research new leads and add them to CRM.", &[], &activity)
            .await
            .unwrap();

        assert_eq!(outcome.reply, "I found three new leads.");
        assert_eq!(outcome.assigned_agents, vec!["Business Operations Director"]);
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(gateway.call_count(), 3);
        assert!(gateway.requests()[2].response_json_schema.is_none());

        let actions: Vec<String> = activity.snapshot().into_iter().map(|e| e.action).collect();
        assert_eq!(actions[0], "Analyzing request...");
        assert_eq!(actions[1], "Routing to Business Operations Director");
    }

    #[tokio::test]
    async fn test_role_failure_skips_synthesis() {
        let gateway = ScriptedGateway::new();
        gateway
            .push_json(json!({"primary_director": "Technology & Security Director"}))
            .push_error(GatewayError::Timeout(60));
        let orchestrator = Orchestrator::with_gateway(Arc::new(gateway.clone()));

        let failure = orchestrator
            .run("Audit our servers", &[], &log())
            .await
            .unwrap_err();
        assert!(matches!(
            failure.error,
            OrchestrationError::Gateway(GatewayError::Timeout(60))
        ));
        assert_eq!(
            failure.decision.map(|d| d.assigned_agents()),
            Some(vec!["Technology & Security Director".to_string()])
        );
        assert_eq!(gateway.call_count(), 2);
    }

    #[tokio::test]
    async fn test_routing_failure_has_no_decision() {
        let gateway = ScriptedGateway::failing("connection refused");
        let orchestrator = Orchestrator::with_gateway(Arc::new(gateway.clone()));

        let failure = orchestrator.run("Anything", &[], &log()).await.unwrap_err();
        assert!(matches!(failure.error, OrchestrationError::RoutingFailed));
        assert!(failure.decision.is_none());
    }
}

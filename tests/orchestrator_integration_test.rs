//! Integration tests for the per-message orchestration flow
//!
//! These tests drive `DirectorService::handle_message` end to end against a
//! throwaway SQLite store and a scripted LLM gateway:
//! 1. Routing (with fallback and total outage)
//! 2. Sequential director execution and synthesis
//! 3. Task, conversation and activity bookkeeping
//! 4. One run per session

use async_trait::async_trait;
use director_backend::compliance::StoreAuditSink;
use director_backend::error::AppError;
use director_backend::gateway::{
    GatewayError, InvokeRequest, LlmGateway, LlmResponse, OfflineGateway, ScriptedGateway,
};
use director_backend::orchestrator::config::OrchestratorConfig;
use director_backend::orchestrator::constants::ROUTING_FAILED_REPLY;
use director_backend::orchestrator::Orchestrator;
use director_backend::services::DirectorService;
use director_backend::session::{ActivityStatus, SessionRegistry};
use director_backend::store::models::{MessageRole, TaskStatus};
use director_backend::store::Store;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::{Notify, RwLock};

struct Harness {
    service: DirectorService,
    store: Arc<Store>,
    sessions: Arc<SessionRegistry>,
    _dir: TempDir,
}

/// Helper to build a service over a fresh database
async fn harness(gateway: Arc<dyn LlmGateway>) -> Harness {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(
        Store::new(dir.path().join("director.db").to_str().unwrap())
            .await
            .unwrap(),
    );
    let sessions = Arc::new(SessionRegistry::new(20));
    let service = DirectorService::new(
        store.clone(),
        Orchestrator::with_gateway(gateway),
        sessions.clone(),
        Arc::new(StoreAuditSink::new(store.clone())),
        Arc::new(RwLock::new(OrchestratorConfig::default())),
    );
    Harness {
        service,
        store,
        sessions,
        _dir: dir,
    }
}

fn director_plan(name: &str) -> serde_json::Value {
    json!({
        "director_name": name,
        "assigned_managers": ["Research Manager"],
        "execution_steps": [
            {"manager": "Research Manager", "task": "Gather data", "agents_needed": ["Lead Qualification Agent"]}
        ],
        "expected_outcomes": ["Done"]
    })
}

/// Example scenario: a CRM request goes to Business Operations only
#[tokio::test]
async fn test_research_leads_scenario() {
    let gateway = ScriptedGateway::new();
    gateway
        .push_json(json!({
            "primary_director": "Business Operations Director",
            "supporting_directors": [],
            "execution_order": ["Business Operations Director"],
            "user_intent": "Find leads and store them",
            "complexity_level": "moderate"
        }))
        .push_json(director_plan("Business Operations Director"))
        .push_text("I researched new leads and added them to your CRM.");
    let h = harness(Arc::new(gateway.clone())).await;

    let reply = h
        .service
        .handle_message("s1", None, "Research new leads and add them to CRM.")
        .await
        .unwrap();

    assert!(reply.success);
    assert_eq!(reply.reply, "I researched new leads and added them to your CRM.");
    assert_eq!(reply.assigned_agents, vec!["Business Operations Director"]);
    assert_eq!(gateway.call_count(), 3);

    let requests = gateway.requests();
    assert!(requests[1].prompt.starts_with("You are the Business Operations Director."));
    assert!(requests[2].response_json_schema.is_none());

    let task = h.store.get_task(&reply.task_id).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.assigned_agents, vec!["Business Operations Director"]);
    assert_eq!(task.result.as_deref(), Some(reply.reply.as_str()));
    assert!(!task.execution_log.is_empty());

    let conversation = h.store.get_conversation(&reply.conversation_id).await.unwrap().unwrap();
    assert_eq!(conversation.title, "Research new leads and add them to CRM.");

    let messages = h.store.get_messages(&reply.conversation_id).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, MessageRole::User);
    assert_eq!(messages[1].role, MessageRole::Assistant);
    assert_eq!(messages[1].agent_name.as_deref(), Some("Master Orchestrator"));
    assert!(messages[1].created_at >= messages[0].created_at);

    let session = h.sessions.get_or_create("s1").await;
    assert!(!session.is_processing());
    let recent = session.activity().recent();
    assert_eq!(recent[0].action, "Task completed successfully");
    assert_eq!(recent[0].status, ActivityStatus::Completed);
}

/// First routing call fails, fallback picks the director
#[tokio::test]
async fn test_routing_fallback() {
    let gateway = ScriptedGateway::new();
    gateway
        .push_json(json!({"primary_director": "Chief Fun Officer"}))
        .push_json(json!({"primary_director": "Financial & Legal Director"}))
        .push_json(director_plan("Financial & Legal Director"))
        .push_text("Your budget is ready.");
    let h = harness(Arc::new(gateway.clone())).await;

    let reply = h
        .service
        .handle_message("s1", None, "Build me a budget for next year")
        .await
        .unwrap();

    assert!(reply.success);
    assert_eq!(reply.assigned_agents, vec!["Financial & Legal Director"]);
    assert_eq!(gateway.call_count(), 4);
    assert!(gateway.requests()[1]
        .prompt
        .contains("Respond with JSON containing only the 'primary_director' key."));
}

/// Total outage: two routing calls, then a routing failure and no execution
#[tokio::test]
async fn test_total_outage() {
    let gateway = ScriptedGateway::failing("connection refused");
    let h = harness(Arc::new(gateway.clone())).await;

    let reply = h
        .service
        .handle_message("s1", Some("u1"), "Help me with something")
        .await
        .unwrap();

    assert!(!reply.success);
    assert_eq!(reply.reply, ROUTING_FAILED_REPLY);
    assert!(reply.assigned_agents.is_empty());
    assert_eq!(gateway.call_count(), 2);

    let task = h.store.get_task(&reply.task_id).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Failed);
    assert_eq!(
        task.result.as_deref(),
        Some("Could not determine which director should handle this request.")
    );

    let session = h.sessions.get_or_create("s1").await;
    let recent = session.activity().recent();
    assert_eq!(recent[0].status, ActivityStatus::Failed);
    assert!(recent[0].action.starts_with("Task failed:"));
    assert!(!session.is_processing());

    let messages = h.store.get_messages(&reply.conversation_id).await.unwrap();
    assert_eq!(messages.last().unwrap().content, ROUTING_FAILED_REPLY);
}

/// A director call failing after routing still records the assigned directors
#[tokio::test]
async fn test_director_failure_keeps_assigned_agents() {
    let gateway = ScriptedGateway::new();
    gateway
        .push_json(json!({
            "primary_director": "Business Operations Director",
            "execution_order": ["Business Operations Director", "Creative & Content Director"]
        }))
        .push_error(GatewayError::Timeout(60));
    let h = harness(Arc::new(gateway.clone())).await;

    let reply = h
        .service
        .handle_message("s1", None, "Find leads and write a launch post")
        .await
        .unwrap();

    let expected = vec![
        "Business Operations Director".to_string(),
        "Creative & Content Director".to_string(),
    ];
    assert!(!reply.success);
    assert_eq!(reply.assigned_agents, expected);
    assert!(reply.decision.is_some());
    assert_eq!(gateway.call_count(), 2);

    let task = h.store.get_task(&reply.task_id).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Failed);
    assert_eq!(task.assigned_agents, expected);
}

/// The same message submitted twice yields two tasks
#[tokio::test]
async fn test_resubmission_creates_new_task() {
    let h = harness(Arc::new(OfflineGateway)).await;

    let first = h.service.handle_message("s1", None, "Plan my day").await.unwrap();
    let second = h.service.handle_message("s1", None, "Plan my day").await.unwrap();

    assert_ne!(first.task_id, second.task_id);
    assert_eq!(first.conversation_id, second.conversation_id);
    assert_eq!(h.store.list_tasks(10).await.unwrap().len(), 2);
    assert_eq!(
        h.store.get_messages(&first.conversation_id).await.unwrap().len(),
        4
    );
}

/// The activity log keeps only the most recent entries
#[tokio::test]
async fn test_activity_cap() {
    let h = harness(Arc::new(OfflineGateway)).await;

    // Five entries per single-director run
    for i in 0..5 {
        h.service
            .handle_message("s1", None, &format!("Request number {}", i))
            .await
            .unwrap();
    }

    let session = h.sessions.get_or_create("s1").await;
    let snapshot = session.activity().snapshot();
    assert_eq!(snapshot.len(), 20);
    assert_eq!(snapshot[0].action, "Analyzing request...");
    assert_eq!(snapshot[19].action, "Task completed successfully");
}

/// Gateway that waits for a signal before answering
struct GatedGateway {
    release: Arc<Notify>,
    inner: OfflineGateway,
}

#[async_trait]
impl LlmGateway for GatedGateway {
    async fn invoke(&self, request: InvokeRequest) -> Result<LlmResponse, GatewayError> {
        self.release.notified().await;
        self.inner.invoke(request).await
    }
}

/// A second message while one is running is rejected
#[tokio::test]
async fn test_session_busy() {
    let release = Arc::new(Notify::new());
    let h = harness(Arc::new(GatedGateway {
        release: release.clone(),
        inner: OfflineGateway,
    }))
    .await;

    let service = h.service.clone();
    let first = tokio::spawn(async move { service.handle_message("s1", None, "First").await });

    let session = h.sessions.get_or_create("s1").await;
    for _ in 0..200 {
        if session.is_processing() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(session.is_processing());

    let second = h.service.handle_message("s1", None, "Second").await;
    assert!(matches!(second, Err(AppError::SessionBusy(_))));

    // Other sessions are unaffected by the busy flag
    assert!(!h.sessions.get_or_create("s2").await.is_processing());

    // Let every gated call through until the run ends
    for _ in 0..400 {
        if first.is_finished() {
            break;
        }
        release.notify_one();
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    let reply = first.await.unwrap().unwrap();
    assert!(reply.success);
    assert!(!session.is_processing());
}

/// Empty and oversized messages are rejected before any work
#[tokio::test]
async fn test_invalid_input() {
    let gateway = ScriptedGateway::new();
    let h = harness(Arc::new(gateway.clone())).await;

    let empty = h.service.handle_message("s1", None, "   ").await;
    assert!(matches!(empty, Err(AppError::InvalidInput(_))));

    let huge = "x".repeat(10_001);
    let oversized = h.service.handle_message("s1", None, &huge).await;
    assert!(matches!(oversized, Err(AppError::InvalidInput(_))));

    assert_eq!(gateway.call_count(), 0);
    assert!(h.store.list_tasks(10).await.unwrap().is_empty());
}

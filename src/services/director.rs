//! Director service
//!
//! The per-message flow behind `POST /api/director/messages`: validate,
//! claim the session, record the conversation, check compliance, open a task,
//! run the orchestrator and persist whatever came out of it.

use crate::compliance::{audit_action, ensure_compliance, AuditSink, ComplianceAction, ComplianceLevel};
use crate::error::AppError;
use crate::orchestrator::config::OrchestratorConfig;
use crate::orchestrator::constants::{ORCHESTRATOR_ACTOR, ROUTING_FAILED_REPLY};
use crate::orchestrator::{
    ConversationTurn, OrchestrationError, Orchestrator, RoutingDecision, RunFailure,
};
use crate::powerups::render_template;
use crate::session::{ActivityStatus, SessionRegistry};
use crate::store::models::{Conversation, Message, MessageRole, Task, TaskStatus, TaskUpdate};
use crate::store::Store;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

const MAX_TITLE_CHARS: usize = 60;
const TRUNCATED_TITLE_CHARS: usize = 47;

/// Reply to one user message
#[derive(Debug, Clone, Serialize)]
pub struct DirectorReply {
    /// Task that recorded the run
    pub task_id: String,
    /// Conversation the exchange was appended to
    pub conversation_id: String,
    /// Text shown to the user
    pub reply: String,
    /// Roles that ran, in order
    pub assigned_agents: Vec<String>,
    /// Routing decision, when routing succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<RoutingDecision>,
    /// Whether the orchestration completed
    pub success: bool,
}

/// Check a request is non-empty and within `max_len` characters
pub fn validate_request(text: &str, max_len: usize) -> Result<(), AppError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput("Message cannot be empty".to_string()));
    }
    if trimmed.chars().count() > max_len {
        return Err(AppError::InvalidInput(format!(
            "Message exceeds maximum length of {} characters",
            max_len
        )));
    }
    Ok(())
}

/// Conversation title derived from its first message
///
/// The first sentence when it fits in 60 characters, otherwise the first 47
/// characters followed by "...".
pub fn conversation_title(first_message: &str) -> String {
    let text = first_message.trim();
    if text.is_empty() {
        return Conversation::UNTITLED.to_string();
    }

    let sentence = match text.find(['.', '!', '?', '\n']) {
        Some(end) => text[..end + 1].trim_end_matches('\n').trim(),
        None => text,
    };
    if sentence.chars().count() <= MAX_TITLE_CHARS {
        return sentence.to_string();
    }

    let head: String = text.chars().take(TRUNCATED_TITLE_CHARS).collect();
    format!("{}...", head.trim_end())
}

/// Reply text for a failed run
fn failure_reply(error: &OrchestrationError) -> String {
    match error {
        OrchestrationError::RoutingFailed => ROUTING_FAILED_REPLY.to_string(),
        other => format!(
            "I encountered an issue processing your request: {}. The technical team has been notified. \
             Please try rephrasing your request, or ask me to try a different approach.",
            other
        ),
    }
}

/// Per-message orchestration with persistence and audit
#[derive(Clone)]
pub struct DirectorService {
    store: Arc<Store>,
    orchestrator: Orchestrator,
    sessions: Arc<SessionRegistry>,
    audit: Arc<dyn AuditSink>,
    config: Arc<RwLock<OrchestratorConfig>>,
}

impl std::fmt::Debug for DirectorService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectorService")
            .field("orchestrator", &self.orchestrator)
            .finish_non_exhaustive()
    }
}

impl DirectorService {
    /// Build the service
    pub fn new(
        store: Arc<Store>,
        orchestrator: Orchestrator,
        sessions: Arc<SessionRegistry>,
        audit: Arc<dyn AuditSink>,
        config: Arc<RwLock<OrchestratorConfig>>,
    ) -> Self {
        Self {
            store,
            orchestrator,
            sessions,
            audit,
            config,
        }
    }

    /// The orchestrator
    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Live sessions
    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    /// Handle one user message end to end
    ///
    /// Orchestration failures are not errors here: they produce a reply with
    /// `success: false` and a task marked failed. Errors are reserved for bad
    /// input, a busy session and storage failures.
    pub async fn handle_message(
        &self,
        session_id: &str,
        user_id: Option<&str>,
        message: &str,
    ) -> Result<DirectorReply, AppError> {
        let config = self.config.read().await.clone();
        validate_request(message, config.max_request_length)?;
        let message = message.trim();

        let session = self.sessions.get_or_create(session_id).await;
        let _guard = session
            .try_begin()
            .ok_or_else(|| AppError::SessionBusy(session_id.to_string()))?;
        let activity = session.activity();

        let conversation = match self.store.latest_conversation(session_id).await? {
            Some(conversation) => conversation,
            None => {
                let conversation = Conversation::new(session_id, conversation_title(message));
                self.store.create_conversation(&conversation).await?;
                conversation
            }
        };

        let history = self
            .conversation_history(&conversation.id, config.max_history_turns)
            .await?;
        self.store
            .add_message(&Message::new(&conversation.id, MessageRole::User, message))
            .await?;

        let level = match user_id {
            Some(user_id) => self
                .store
                .get_compliance_profile(user_id)
                .await?
                .map(|profile| profile.compliance_level)
                .unwrap_or_default(),
            None => ComplianceLevel::Standard,
        };
        let action = ComplianceAction::new("message", message);
        let report = ensure_compliance(&action, user_id, level);
        audit_action(
            self.audit.as_ref(),
            user_id.unwrap_or("anonymous"),
            &action,
            json!({ "audit_log_id": report.audit_log_id, "compliance_level": level.as_str() }),
        )
        .await;

        let task = Task::new(session_id, message);
        self.store.create_task(&task).await?;
        self.store
            .persist_task(
                &task.id,
                TaskUpdate {
                    status: Some(TaskStatus::Processing),
                    ..Default::default()
                },
            )
            .await?;

        match self.orchestrator.run(message, &history, activity).await {
            Ok(outcome) => {
                self.store
                    .add_message(
                        &Message::new(&conversation.id, MessageRole::Assistant, &outcome.reply)
                            .with_agent(ORCHESTRATOR_ACTOR),
                    )
                    .await?;
                activity.add(
                    ORCHESTRATOR_ACTOR,
                    "Task completed successfully",
                    ActivityStatus::Completed,
                );
                self.store
                    .persist_task(
                        &task.id,
                        TaskUpdate {
                            status: Some(TaskStatus::Completed),
                            result: Some(outcome.reply.clone()),
                            assigned_agents: Some(outcome.assigned_agents.clone()),
                            execution_log: Some(activity.snapshot()),
                        },
                    )
                    .await?;
                audit_action(
                    self.audit.as_ref(),
                    user_id.unwrap_or("anonymous"),
                    &ComplianceAction::new("task_completion", format!("Task {}", task.id)),
                    json!({ "success": true, "task_id": task.id }),
                )
                .await;

                info!(task_id = %task.id, agents = outcome.assigned_agents.len(), "Task completed");
                Ok(DirectorReply {
                    task_id: task.id,
                    conversation_id: conversation.id,
                    reply: outcome.reply,
                    assigned_agents: outcome.assigned_agents,
                    decision: Some(outcome.decision),
                    success: true,
                })
            }
            Err(RunFailure { decision, error: e }) => {
                warn!(task_id = %task.id, error = %e, "Task failed");
                let reply = failure_reply(&e);
                let assigned_agents = decision
                    .as_ref()
                    .map(RoutingDecision::assigned_agents)
                    .unwrap_or_default();

                activity.add(
                    ORCHESTRATOR_ACTOR,
                    format!("Task failed: {}", e),
                    ActivityStatus::Failed,
                );
                self.store
                    .add_message(
                        &Message::new(&conversation.id, MessageRole::Assistant, &reply)
                            .with_agent(ORCHESTRATOR_ACTOR),
                    )
                    .await?;
                self.store
                    .persist_task(
                        &task.id,
                        TaskUpdate {
                            status: Some(TaskStatus::Failed),
                            result: Some(e.to_string()),
                            assigned_agents: Some(assigned_agents.clone()),
                            execution_log: Some(activity.snapshot()),
                        },
                    )
                    .await?;
                audit_action(
                    self.audit.as_ref(),
                    user_id.unwrap_or("anonymous"),
                    &ComplianceAction::new("task_completion", format!("Task {}", task.id)),
                    json!({ "success": false, "task_id": task.id }),
                )
                .await;

                Ok(DirectorReply {
                    task_id: task.id,
                    conversation_id: conversation.id,
                    reply,
                    assigned_agents,
                    decision,
                    success: false,
                })
            }
        }
    }

    /// Render a power-up and submit it as a regular message
    pub async fn execute_powerup(
        &self,
        powerup_id: &str,
        session_id: &str,
        user_id: Option<&str>,
        inputs: &HashMap<String, String>,
    ) -> Result<DirectorReply, AppError> {
        let powerup = self
            .store
            .get_powerup(powerup_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Power-up {}", powerup_id)))?;
        let request = render_template(&powerup.prompt_template, inputs)?;
        info!(powerup = %powerup.name, "Executing power-up");
        self.handle_message(session_id, user_id, &request).await
    }

    /// Most recent `limit` turns of a conversation, oldest first
    async fn conversation_history(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, AppError> {
        let messages = self.store.get_messages(conversation_id).await?;
        let skip = messages.len().saturating_sub(limit);
        Ok(messages
            .into_iter()
            .skip(skip)
            .map(|m| ConversationTurn {
                role: m.role.as_str().to_string(),
                content: m.content,
            })
            .collect())
    }
}

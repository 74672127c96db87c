//! Persisted entities
//!
//! Timestamps are Unix seconds. List-valued fields are stored as JSON text.

use crate::compliance::ComplianceLevel;
use crate::session::ActivityEntry;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Created, not started
    Pending,
    /// Orchestration running
    Processing,
    /// Finished with a reply
    Completed,
    /// Finished with an error
    Failed,
}

impl TaskStatus {
    /// Database / wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    /// Whether moving from `self` to `next` keeps the lifecycle monotonic
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::Processing)
                | (TaskStatus::Pending, TaskStatus::Failed)
                | (TaskStatus::Processing, TaskStatus::Completed)
                | (TaskStatus::Processing, TaskStatus::Failed)
        )
    }

    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "processing" => Ok(TaskStatus::Processing),
            "completed" => Ok(TaskStatus::Completed),
            "failed" => Ok(TaskStatus::Failed),
            other => Err(format!("unknown task status: {}", other)),
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    /// Low
    Low,
    /// Medium (default for chat messages)
    #[default]
    Medium,
    /// High
    High,
}

impl TaskPriority {
    /// Database / wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

impl FromStr for TaskPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            other => Err(format!("unknown task priority: {}", other)),
        }
    }
}

/// Durable record of one submitted message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// Unique identifier
    pub id: String,
    /// Session that submitted the message
    pub session_id: String,
    /// The user's message
    pub user_request: String,
    /// Lifecycle state
    pub status: TaskStatus,
    /// Priority
    pub priority: TaskPriority,
    /// Roles that ran, in order
    pub assigned_agents: Vec<String>,
    /// Activity snapshot taken when the task finished
    pub execution_log: Vec<ActivityEntry>,
    /// Final reply or error text
    pub result: Option<String>,
    /// Created (Unix seconds)
    pub created_at: i64,
    /// Last updated (Unix seconds)
    pub updated_at: i64,
}

impl Task {
    /// New pending task for `user_request`
    pub fn new(session_id: impl Into<String>, user_request: impl Into<String>) -> Self {
        let now = Utc::now().timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.into(),
            user_request: user_request.into(),
            status: TaskStatus::Pending,
            priority: TaskPriority::default(),
            assigned_agents: Vec::new(),
            execution_log: Vec::new(),
            result: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Changes applied to a task in a single write
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    /// New status (must be a legal transition)
    pub status: Option<TaskStatus>,
    /// Final reply or error
    pub result: Option<String>,
    /// Roles that ran
    pub assigned_agents: Option<Vec<String>>,
    /// Activity snapshot
    pub execution_log: Option<Vec<ActivityEntry>>,
}

/// Sender of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// The user
    User,
    /// The assistant
    Assistant,
}

impl MessageRole {
    /// Database / wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl From<&str> for MessageRole {
    fn from(s: &str) -> Self {
        match s {
            "assistant" => MessageRole::Assistant,
            _ => MessageRole::User,
        }
    }
}

/// A conversation thread
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Conversation {
    /// Unique identifier
    pub id: String,
    /// Session the conversation belongs to
    pub session_id: String,
    /// Title (generated from the first message or user-set)
    pub title: String,
    /// Created (Unix seconds)
    pub created_at: i64,
    /// Last updated (Unix seconds)
    pub updated_at: i64,
}

impl Conversation {
    /// Default title before the first message
    pub const UNTITLED: &'static str = "New Conversation";

    /// New empty conversation
    pub fn new(session_id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now().timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.into(),
            title: title.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// One message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Unique identifier
    pub id: String,
    /// Owning conversation
    pub conversation_id: String,
    /// Sender
    pub role: MessageRole,
    /// Text
    pub content: String,
    /// Role that produced an assistant message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    /// Created (Unix seconds)
    pub created_at: i64,
}

impl Message {
    /// New message stamped now
    pub fn new(
        conversation_id: impl Into<String>,
        role: MessageRole,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            conversation_id: conversation_id.into(),
            role,
            content: content.into(),
            agent_name: None,
            created_at: Utc::now().timestamp(),
        }
    }

    /// Attribute the message to a role
    pub fn with_agent(mut self, agent_name: impl Into<String>) -> Self {
        self.agent_name = Some(agent_name.into());
        self
    }
}

/// CRM contact
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contact {
    /// Unique identifier
    pub id: String,
    /// Full name
    pub full_name: String,
    /// Email
    pub email: Option<String>,
    /// Phone
    pub phone: Option<String>,
    /// Company
    pub company: Option<String>,
    /// Job title
    pub position: Option<String>,
    /// LinkedIn profile
    pub linkedin_url: Option<String>,
    /// Pipeline stage
    pub lead_status: String,
    /// Notes on the lead
    pub lead_summary: Option<String>,
    /// Free-form tags
    pub tags: Vec<String>,
    /// Created (Unix seconds)
    pub created_at: i64,
}

fn default_lead_status() -> String {
    "new".to_string()
}

/// Input for creating or replacing a contact
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewContact {
    /// Full name
    pub full_name: String,
    /// Email
    #[serde(default)]
    pub email: Option<String>,
    /// Phone
    #[serde(default)]
    pub phone: Option<String>,
    /// Company
    #[serde(default)]
    pub company: Option<String>,
    /// Job title
    #[serde(default)]
    pub position: Option<String>,
    /// LinkedIn profile
    #[serde(default)]
    pub linkedin_url: Option<String>,
    /// Pipeline stage
    #[serde(default = "default_lead_status")]
    pub lead_status: String,
    /// Notes on the lead
    #[serde(default)]
    pub lead_summary: Option<String>,
    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Content calendar entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentCalendarEntry {
    /// Unique identifier
    pub id: String,
    /// Title
    pub title: String,
    /// Body
    pub content: Option<String>,
    /// Target platform
    pub platform: Option<String>,
    /// Topic
    pub topic: Option<String>,
    /// draft / scheduled / published
    pub status: String,
    /// When to publish (ISO date)
    pub scheduled_date: Option<String>,
    /// Created (Unix seconds)
    pub created_at: i64,
}

fn default_content_status() -> String {
    "draft".to_string()
}

/// Input for a content calendar entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewContentEntry {
    /// Title
    pub title: String,
    /// Body
    #[serde(default)]
    pub content: Option<String>,
    /// Target platform
    #[serde(default)]
    pub platform: Option<String>,
    /// Topic
    #[serde(default)]
    pub topic: Option<String>,
    /// draft / scheduled / published
    #[serde(default = "default_content_status")]
    pub status: String,
    /// When to publish (ISO date)
    #[serde(default)]
    pub scheduled_date: Option<String>,
}

/// Audit trail record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditLogEntry {
    /// Unique identifier
    pub id: String,
    /// Acting user
    pub user_id: String,
    /// Kind of action
    pub action_type: String,
    /// Action details
    pub action_details: String,
    /// Outcome payload
    pub result: Value,
    /// Always masked
    pub ip_address: String,
    /// When (Unix seconds)
    pub timestamp: i64,
}

impl AuditLogEntry {
    /// Placeholder stored instead of the client address
    pub const MASKED_IP: &'static str = "masked_for_privacy";

    /// New entry stamped now
    pub fn new(
        user_id: impl Into<String>,
        action_type: impl Into<String>,
        action_details: impl Into<String>,
        result: Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            action_type: action_type.into(),
            action_details: action_details.into(),
            result,
            ip_address: Self::MASKED_IP.to_string(),
            timestamp: Utc::now().timestamp(),
        }
    }
}

/// Per-user compliance settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComplianceProfile {
    /// User
    pub user_id: String,
    /// Regulatory regime
    pub compliance_level: ComplianceLevel,
    /// Whether MFA is enabled for the user
    #[serde(default)]
    pub mfa_enabled: bool,
}

impl ComplianceProfile {
    /// Profile applied to users without one
    pub fn standard(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            compliance_level: ComplianceLevel::Standard,
            mfa_enabled: false,
        }
    }
}

/// Reusable request template
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PowerUp {
    /// Unique identifier
    pub id: String,
    /// Name
    pub name: String,
    /// What it does
    pub description: Option<String>,
    /// Request text with `{variable}` placeholders
    pub prompt_template: String,
    /// Created (Unix seconds)
    pub created_at: i64,
}

/// Input for a power-up
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewPowerUp {
    /// Name
    pub name: String,
    /// What it does
    #[serde(default)]
    pub description: Option<String>,
    /// Request text with `{variable}` placeholders
    pub prompt_template: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_status_transitions_are_monotonic() {
        use TaskStatus::*;
        assert!(Pending.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Completed));
        assert!(Processing.can_transition_to(Failed));
        assert!(!Completed.can_transition_to(Processing));
        assert!(!Failed.can_transition_to(Completed));
        assert!(!Processing.can_transition_to(Pending));
        assert!(!Processing.can_transition_to(Processing));
    }

    #[test]
    fn test_new_task_is_pending_with_unique_id() {
        let a = Task::new("s", "hello");
        let b = Task::new("s", "hello");
        assert_eq!(a.status, TaskStatus::Pending);
        assert_eq!(a.priority, TaskPriority::Medium);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_new_contact_defaults() {
        let contact: NewContact = serde_json::from_str(r#"{"full_name": "Ada"}"#).unwrap();
        assert_eq!(contact.lead_status, "new");
        assert!(contact.tags.is_empty());
    }
}

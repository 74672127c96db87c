//! SQLite-backed store
//!
//! Handles every database interaction: tasks, conversations and messages,
//! contacts, the content calendar, the audit log, compliance profiles and
//! power-ups.

use crate::compliance::ComplianceLevel;
use crate::error::AppError;
use crate::store::models::*;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

fn db_error(action: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::Database(format!("{}: {}", action, e))
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, AppError> {
    serde_json::to_string(value)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode column: {}", e)))
}

fn from_json<T: DeserializeOwned>(column: &'static str, raw: &str) -> Result<T, AppError> {
    serde_json::from_str(raw)
        .map_err(|e| AppError::Database(format!("Corrupt {} column: {}", column, e)))
}

#[derive(FromRow)]
struct TaskRow {
    id: String,
    session_id: String,
    user_request: String,
    status: String,
    priority: String,
    assigned_agents: String,
    execution_log: String,
    result: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<TaskRow> for Task {
    type Error = AppError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(Task {
            status: TaskStatus::from_str(&row.status).map_err(AppError::Database)?,
            priority: TaskPriority::from_str(&row.priority).map_err(AppError::Database)?,
            assigned_agents: from_json("assigned_agents", &row.assigned_agents)?,
            execution_log: from_json("execution_log", &row.execution_log)?,
            id: row.id,
            session_id: row.session_id,
            user_request: row.user_request,
            result: row.result,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct MessageRow {
    id: String,
    conversation_id: String,
    role: String,
    content: String,
    agent_name: Option<String>,
    created_at: i64,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Message {
            role: MessageRole::from(row.role.as_str()),
            id: row.id,
            conversation_id: row.conversation_id,
            content: row.content,
            agent_name: row.agent_name,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct ContactRow {
    id: String,
    full_name: String,
    email: Option<String>,
    phone: Option<String>,
    company: Option<String>,
    position: Option<String>,
    linkedin_url: Option<String>,
    lead_status: String,
    lead_summary: Option<String>,
    tags: String,
    created_at: i64,
}

impl TryFrom<ContactRow> for Contact {
    type Error = AppError;

    fn try_from(row: ContactRow) -> Result<Self, Self::Error> {
        Ok(Contact {
            tags: from_json("tags", &row.tags)?,
            id: row.id,
            full_name: row.full_name,
            email: row.email,
            phone: row.phone,
            company: row.company,
            position: row.position,
            linkedin_url: row.linkedin_url,
            lead_status: row.lead_status,
            lead_summary: row.lead_summary,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct ContentRow {
    id: String,
    title: String,
    content: Option<String>,
    platform: Option<String>,
    topic: Option<String>,
    status: String,
    scheduled_date: Option<String>,
    created_at: i64,
}

impl From<ContentRow> for ContentCalendarEntry {
    fn from(row: ContentRow) -> Self {
        ContentCalendarEntry {
            id: row.id,
            title: row.title,
            content: row.content,
            platform: row.platform,
            topic: row.topic,
            status: row.status,
            scheduled_date: row.scheduled_date,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct AuditRow {
    id: String,
    user_id: String,
    action_type: String,
    action_details: String,
    result: String,
    ip_address: String,
    timestamp: i64,
}

impl TryFrom<AuditRow> for AuditLogEntry {
    type Error = AppError;

    fn try_from(row: AuditRow) -> Result<Self, Self::Error> {
        Ok(AuditLogEntry {
            result: from_json("result", &row.result)?,
            id: row.id,
            user_id: row.user_id,
            action_type: row.action_type,
            action_details: row.action_details,
            ip_address: row.ip_address,
            timestamp: row.timestamp,
        })
    }
}

#[derive(FromRow)]
struct ComplianceRow {
    user_id: String,
    compliance_level: String,
    mfa_enabled: bool,
}

#[derive(FromRow)]
struct PowerUpRow {
    id: String,
    name: String,
    description: Option<String>,
    prompt_template: String,
    created_at: i64,
}

impl From<PowerUpRow> for PowerUp {
    fn from(row: PowerUpRow) -> Self {
        PowerUp {
            id: row.id,
            name: row.name,
            description: row.description,
            prompt_template: row.prompt_template,
            created_at: row.created_at,
        }
    }
}

const TASK_COLUMNS: &str = "id, session_id, user_request, status, priority, assigned_agents, execution_log, result, created_at, updated_at";
const CONTACT_COLUMNS: &str = "id, full_name, email, phone, company, position, linkedin_url, lead_status, lead_summary, tags, created_at";

/// Database connection pool shared by every service
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (or create) the database at `db_path` and run migrations
    pub async fn new(db_path: &str) -> Result<Self, AppError> {
        let connection_string = if db_path.starts_with("sqlite:") {
            db_path.to_string()
        } else {
            if let Some(parent) = PathBuf::from(db_path).parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::Internal(anyhow::anyhow!("Failed to create db directory: {}", e))
                })?;
            }
            format!("sqlite:{}", db_path)
        };

        let options = SqliteConnectOptions::from_str(&connection_string)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid database path: {}", e)))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(db_error("Failed to connect to database"))?;

        info!("Connected to SQLite database at: {}", db_path);

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations...");

        let migration_sql = include_str!("../../migrations/001_init.sql");

        // Drop comments, then split into statements
        let mut cleaned_sql = String::new();
        for line in migration_sql.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with("--") {
                continue;
            }
            let without_comments = match trimmed.find("--") {
                Some(pos) => &trimmed[..pos],
                None => trimmed,
            };
            cleaned_sql.push_str(without_comments.trim());
            cleaned_sql.push(' ');
        }

        for statement in cleaned_sql.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::Database(format!(
                        "Migration failed: {} - Statement: {}",
                        e,
                        statement.chars().take(100).collect::<String>()
                    ))
                })?;
        }

        info!("Database migrations completed successfully");
        Ok(())
    }

    // ---- tasks ----

    /// Insert a new task
    pub async fn create_task(&self, task: &Task) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO tasks (id, session_id, user_request, status, priority, assigned_agents, execution_log, result, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&task.id)
        .bind(&task.session_id)
        .bind(&task.user_request)
        .bind(task.status.as_str())
        .bind(task.priority.as_str())
        .bind(to_json(&task.assigned_agents)?)
        .bind(to_json(&task.execution_log)?)
        .bind(&task.result)
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to create task"))?;

        debug!(task_id = %task.id, "Created task");
        Ok(())
    }

    /// Fetch a task by id
    pub async fn get_task(&self, id: &str) -> Result<Option<Task>, AppError> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {} FROM tasks WHERE id = ?",
            TASK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to fetch task"))?;

        row.map(Task::try_from).transpose()
    }

    /// Most recent tasks first
    pub async fn list_tasks(&self, limit: i64) -> Result<Vec<Task>, AppError> {
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {} FROM tasks ORDER BY created_at DESC, rowid DESC LIMIT ?",
            TASK_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to fetch tasks"))?;

        rows.into_iter().map(Task::try_from).collect()
    }

    /// Apply `update` to a task in one write
    ///
    /// Status changes must follow the task lifecycle; anything else is
    /// rejected with [`AppError::InvalidTransition`].
    pub async fn persist_task(&self, id: &str, update: TaskUpdate) -> Result<Task, AppError> {
        let mut task = self
            .get_task(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Task {}", id)))?;
        let previous = task.status;

        if let Some(next) = update.status {
            if !previous.can_transition_to(next) {
                return Err(AppError::InvalidTransition {
                    from: previous,
                    to: next,
                });
            }
            task.status = next;
        }
        if let Some(result) = update.result {
            task.result = Some(result);
        }
        if let Some(agents) = update.assigned_agents {
            task.assigned_agents = agents;
        }
        if let Some(log) = update.execution_log {
            task.execution_log = log;
        }
        task.updated_at = Utc::now().timestamp().max(task.updated_at);

        let updated = sqlx::query(
            "UPDATE tasks SET status = ?, result = ?, assigned_agents = ?, execution_log = ?, updated_at = ? WHERE id = ? AND status = ?",
        )
        .bind(task.status.as_str())
        .bind(&task.result)
        .bind(to_json(&task.assigned_agents)?)
        .bind(to_json(&task.execution_log)?)
        .bind(task.updated_at)
        .bind(id)
        .bind(previous.as_str())
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to update task"))?;

        // Someone else moved the task since we read it
        if updated.rows_affected() == 0 {
            let current = self.get_task(id).await?.map(|t| t.status).unwrap_or(previous);
            return Err(AppError::InvalidTransition {
                from: current,
                to: task.status,
            });
        }

        debug!(task_id = %id, status = %task.status, "Persisted task");
        Ok(task)
    }

    // ---- conversations ----

    /// Conversations, most recently updated first
    pub async fn list_conversations(
        &self,
        session_id: Option<&str>,
    ) -> Result<Vec<Conversation>, AppError> {
        let conversations = match session_id {
            Some(session_id) => sqlx::query_as::<_, Conversation>(
                "SELECT id, session_id, title, created_at, updated_at FROM conversations WHERE session_id = ? ORDER BY updated_at DESC, rowid DESC",
            )
            .bind(session_id)
            .fetch_all(&self.pool)
            .await,
            None => sqlx::query_as::<_, Conversation>(
                "SELECT id, session_id, title, created_at, updated_at FROM conversations ORDER BY updated_at DESC, rowid DESC",
            )
            .fetch_all(&self.pool)
            .await,
        }
        .map_err(db_error("Failed to fetch conversations"))?;

        Ok(conversations)
    }

    /// Fetch a conversation by id
    pub async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, AppError> {
        sqlx::query_as::<_, Conversation>(
            "SELECT id, session_id, title, created_at, updated_at FROM conversations WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to fetch conversation"))
    }

    /// Latest conversation of a session, if any
    pub async fn latest_conversation(
        &self,
        session_id: &str,
    ) -> Result<Option<Conversation>, AppError> {
        Ok(self.list_conversations(Some(session_id)).await?.into_iter().next())
    }

    /// Insert a conversation
    pub async fn create_conversation(&self, conversation: &Conversation) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO conversations (id, session_id, title, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&conversation.id)
        .bind(&conversation.session_id)
        .bind(&conversation.title)
        .bind(conversation.created_at)
        .bind(conversation.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to create conversation"))?;

        debug!("Created conversation: {}", conversation.id);
        Ok(())
    }

    /// Rename a conversation
    pub async fn update_conversation_title(&self, id: &str, title: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE conversations SET title = ?, updated_at = ? WHERE id = ?")
            .bind(title)
            .bind(Utc::now().timestamp())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to update conversation"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Conversation {}", id)));
        }
        Ok(())
    }

    /// Delete a conversation and its messages
    pub async fn delete_conversation(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM conversations WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to delete conversation"))?;

        debug!("Deleted conversation: {}", id);
        Ok(result.rows_affected() > 0)
    }

    /// Messages of a conversation in insertion order
    pub async fn get_messages(&self, conversation_id: &str) -> Result<Vec<Message>, AppError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            "SELECT id, conversation_id, role, content, agent_name, created_at FROM messages WHERE conversation_id = ? ORDER BY created_at ASC, rowid ASC",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to fetch messages"))?;

        Ok(rows.into_iter().map(Message::from).collect())
    }

    /// Append a message and touch its conversation
    pub async fn add_message(&self, message: &Message) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO messages (id, conversation_id, role, content, agent_name, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&message.id)
        .bind(&message.conversation_id)
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(&message.agent_name)
        .bind(message.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to add message"))?;

        sqlx::query("UPDATE conversations SET updated_at = MAX(updated_at, ?) WHERE id = ?")
            .bind(message.created_at)
            .bind(&message.conversation_id)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to touch conversation"))?;

        debug!(
            "Added message {} to conversation {}",
            message.id, message.conversation_id
        );
        Ok(())
    }

    // ---- contacts ----

    /// All contacts, newest first
    pub async fn list_contacts(&self) -> Result<Vec<Contact>, AppError> {
        let rows = sqlx::query_as::<_, ContactRow>(&format!(
            "SELECT {} FROM contacts ORDER BY created_at DESC, rowid DESC",
            CONTACT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to fetch contacts"))?;

        rows.into_iter().map(Contact::try_from).collect()
    }

    /// Fetch a contact by id
    pub async fn get_contact(&self, id: &str) -> Result<Option<Contact>, AppError> {
        let row = sqlx::query_as::<_, ContactRow>(&format!(
            "SELECT {} FROM contacts WHERE id = ?",
            CONTACT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to fetch contact"))?;

        row.map(Contact::try_from).transpose()
    }

    /// Insert a contact
    pub async fn create_contact(&self, input: NewContact) -> Result<Contact, AppError> {
        let contact = Contact {
            id: Uuid::new_v4().to_string(),
            full_name: input.full_name,
            email: input.email,
            phone: input.phone,
            company: input.company,
            position: input.position,
            linkedin_url: input.linkedin_url,
            lead_status: input.lead_status,
            lead_summary: input.lead_summary,
            tags: input.tags,
            created_at: Utc::now().timestamp(),
        };

        sqlx::query(&format!(
            "INSERT INTO contacts ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            CONTACT_COLUMNS
        ))
        .bind(&contact.id)
        .bind(&contact.full_name)
        .bind(&contact.email)
        .bind(&contact.phone)
        .bind(&contact.company)
        .bind(&contact.position)
        .bind(&contact.linkedin_url)
        .bind(&contact.lead_status)
        .bind(&contact.lead_summary)
        .bind(to_json(&contact.tags)?)
        .bind(contact.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to create contact"))?;

        debug!(contact_id = %contact.id, "Created contact");
        Ok(contact)
    }

    /// Replace a contact's fields
    pub async fn update_contact(&self, id: &str, input: NewContact) -> Result<Contact, AppError> {
        let result = sqlx::query(
            "UPDATE contacts SET full_name = ?, email = ?, phone = ?, company = ?, position = ?, linkedin_url = ?, lead_status = ?, lead_summary = ?, tags = ? WHERE id = ?",
        )
        .bind(&input.full_name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.company)
        .bind(&input.position)
        .bind(&input.linkedin_url)
        .bind(&input.lead_status)
        .bind(&input.lead_summary)
        .bind(to_json(&input.tags)?)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to update contact"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Contact {}", id)));
        }
        self.get_contact(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Contact {}", id)))
    }

    /// Delete a contact
    pub async fn delete_contact(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to delete contact"))?;
        Ok(result.rows_affected() > 0)
    }

    // ---- content calendar ----

    /// Calendar entries ordered by schedule
    pub async fn list_content_entries(&self) -> Result<Vec<ContentCalendarEntry>, AppError> {
        let rows = sqlx::query_as::<_, ContentRow>(
            "SELECT id, title, content, platform, topic, status, scheduled_date, created_at FROM content_calendar ORDER BY scheduled_date IS NULL, scheduled_date ASC, created_at ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to fetch content calendar"))?;

        Ok(rows.into_iter().map(ContentCalendarEntry::from).collect())
    }

    /// Insert a calendar entry
    pub async fn create_content_entry(
        &self,
        input: NewContentEntry,
    ) -> Result<ContentCalendarEntry, AppError> {
        let entry = ContentCalendarEntry {
            id: Uuid::new_v4().to_string(),
            title: input.title,
            content: input.content,
            platform: input.platform,
            topic: input.topic,
            status: input.status,
            scheduled_date: input.scheduled_date,
            created_at: Utc::now().timestamp(),
        };

        sqlx::query(
            "INSERT INTO content_calendar (id, title, content, platform, topic, status, scheduled_date, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&entry.id)
        .bind(&entry.title)
        .bind(&entry.content)
        .bind(&entry.platform)
        .bind(&entry.topic)
        .bind(&entry.status)
        .bind(&entry.scheduled_date)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to create content entry"))?;

        Ok(entry)
    }

    // ---- audit ----

    /// Append an audit record
    pub async fn append_audit(&self, entry: &AuditLogEntry) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO audit_log (id, user_id, action_type, action_details, result, ip_address, timestamp) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&entry.id)
        .bind(&entry.user_id)
        .bind(&entry.action_type)
        .bind(&entry.action_details)
        .bind(to_json(&entry.result)?)
        .bind(&entry.ip_address)
        .bind(entry.timestamp)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to write audit log"))?;
        Ok(())
    }

    /// Audit records, newest first, optionally for one user
    pub async fn list_audit(
        &self,
        user_id: Option<&str>,
        limit: i64,
    ) -> Result<Vec<AuditLogEntry>, AppError> {
        let rows = match user_id {
            Some(user_id) => sqlx::query_as::<_, AuditRow>(
                "SELECT id, user_id, action_type, action_details, result, ip_address, timestamp FROM audit_log WHERE user_id = ? ORDER BY timestamp DESC, rowid DESC LIMIT ?",
            )
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await,
            None => sqlx::query_as::<_, AuditRow>(
                "SELECT id, user_id, action_type, action_details, result, ip_address, timestamp FROM audit_log ORDER BY timestamp DESC, rowid DESC LIMIT ?",
            )
            .bind(limit)
            .fetch_all(&self.pool)
            .await,
        }
        .map_err(db_error("Failed to fetch audit log"))?;

        rows.into_iter().map(AuditLogEntry::try_from).collect()
    }

    // ---- compliance profiles ----

    /// Compliance profile of a user, if set
    pub async fn get_compliance_profile(
        &self,
        user_id: &str,
    ) -> Result<Option<ComplianceProfile>, AppError> {
        let row = sqlx::query_as::<_, ComplianceRow>(
            "SELECT user_id, compliance_level, mfa_enabled FROM compliance_profiles WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to fetch compliance profile"))?;

        row.map(|row| {
            Ok(ComplianceProfile {
                compliance_level: ComplianceLevel::from_str(&row.compliance_level)
                    .map_err(AppError::Database)?,
                user_id: row.user_id,
                mfa_enabled: row.mfa_enabled,
            })
        })
        .transpose()
    }

    /// Insert or replace a compliance profile
    pub async fn upsert_compliance_profile(
        &self,
        profile: &ComplianceProfile,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO compliance_profiles (user_id, compliance_level, mfa_enabled) VALUES (?, ?, ?) ON CONFLICT(user_id) DO UPDATE SET compliance_level = excluded.compliance_level, mfa_enabled = excluded.mfa_enabled",
        )
        .bind(&profile.user_id)
        .bind(profile.compliance_level.as_str())
        .bind(profile.mfa_enabled)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to save compliance profile"))?;
        Ok(())
    }

    // ---- power-ups ----

    /// Power-ups, newest first
    pub async fn list_powerups(&self) -> Result<Vec<PowerUp>, AppError> {
        let rows = sqlx::query_as::<_, PowerUpRow>(
            "SELECT id, name, description, prompt_template, created_at FROM powerups ORDER BY created_at DESC, rowid DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to fetch power-ups"))?;

        Ok(rows.into_iter().map(PowerUp::from).collect())
    }

    /// Fetch a power-up by id
    pub async fn get_powerup(&self, id: &str) -> Result<Option<PowerUp>, AppError> {
        let row = sqlx::query_as::<_, PowerUpRow>(
            "SELECT id, name, description, prompt_template, created_at FROM powerups WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to fetch power-up"))?;

        Ok(row.map(PowerUp::from))
    }

    /// Insert a power-up
    pub async fn create_powerup(&self, input: NewPowerUp) -> Result<PowerUp, AppError> {
        let powerup = PowerUp {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            description: input.description,
            prompt_template: input.prompt_template,
            created_at: Utc::now().timestamp(),
        };

        sqlx::query(
            "INSERT INTO powerups (id, name, description, prompt_template, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&powerup.id)
        .bind(&powerup.name)
        .bind(&powerup.description)
        .bind(&powerup.prompt_template)
        .bind(powerup.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to create power-up"))?;

        Ok(powerup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{ActivityEntry, ActivityStatus};
    use serde_json::json;
    use tempfile::TempDir;

    async fn test_store() -> (Store, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        let store = Store::new(path.to_str().unwrap()).await.unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn test_task_lifecycle() {
        let (store, _dir) = test_store().await;
        let task = Task::new("default", "Research new leads");
        store.create_task(&task).await.unwrap();

        store
            .persist_task(
                &task.id,
                TaskUpdate {
                    status: Some(TaskStatus::Processing),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let log = vec![ActivityEntry {
            actor: "Master Orchestrator".to_string(),
            action: "Task completed successfully".to_string(),
            status: ActivityStatus::Completed,
            timestamp: Utc::now(),
        }];
        let done = store
            .persist_task(
                &task.id,
                TaskUpdate {
                    status: Some(TaskStatus::Completed),
                    result: Some("Done".to_string()),
                    assigned_agents: Some(vec!["Business Operations Director".to_string()]),
                    execution_log: Some(log.clone()),
                },
            )
            .await
            .unwrap();

        let stored = store.get_task(&task.id).await.unwrap().unwrap();
        assert_eq!(stored, done);
        assert_eq!(stored.status, TaskStatus::Completed);
        assert_eq!(stored.execution_log, log);
        assert_eq!(stored.assigned_agents, vec!["Business Operations Director"]);
    }

    #[tokio::test]
    async fn test_task_status_cannot_go_backwards() {
        let (store, _dir) = test_store().await;
        let task = Task::new("default", "hello");
        store.create_task(&task).await.unwrap();

        let result = store
            .persist_task(
                &task.id,
                TaskUpdate {
                    status: Some(TaskStatus::Completed),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(
            result,
            Err(AppError::InvalidTransition {
                from: TaskStatus::Pending,
                to: TaskStatus::Completed
            })
        ));
    }

    #[tokio::test]
    async fn test_messages_keep_insertion_order() {
        let (store, _dir) = test_store().await;
        let conversation = Conversation::new("default", "Test");
        store.create_conversation(&conversation).await.unwrap();

        let user = Message::new(&conversation.id, MessageRole::User, "hi");
        let reply = Message::new(&conversation.id, MessageRole::Assistant, "hello")
            .with_agent("Master Orchestrator");
        store.add_message(&user).await.unwrap();
        store.add_message(&reply).await.unwrap();

        let messages = store.get_messages(&conversation.id).await.unwrap();
        assert_eq!(messages, vec![user, reply]);

        assert!(store.delete_conversation(&conversation.id).await.unwrap());
        assert!(store.get_messages(&conversation.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_latest_conversation_per_session() {
        let (store, _dir) = test_store().await;
        let mut old = Conversation::new("s1", "old");
        old.updated_at -= 100;
        let new = Conversation::new("s1", "new");
        let other = Conversation::new("s2", "other");
        for c in [&old, &new, &other] {
            store.create_conversation(c).await.unwrap();
        }

        let latest = store.latest_conversation("s1").await.unwrap().unwrap();
        assert_eq!(latest.id, new.id);
        assert!(store.latest_conversation("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_contacts_crud() {
        let (store, _dir) = test_store().await;
        let created = store
            .create_contact(NewContact {
                full_name: "Ada Lovelace".to_string(),
                email: Some("ada@example.com".to_string()),
                phone: None,
                company: Some("Analytical".to_string()),
                position: None,
                linkedin_url: None,
                lead_status: "new".to_string(),
                lead_summary: None,
                tags: vec!["vip".to_string()],
            })
            .await
            .unwrap();

        let mut input: NewContact =
            serde_json::from_value(json!({"full_name": "Ada King", "lead_status": "qualified"}))
                .unwrap();
        input.tags = vec!["vip".to_string(), "warm".to_string()];
        let updated = store.update_contact(&created.id, input).await.unwrap();
        assert_eq!(updated.full_name, "Ada King");
        assert_eq!(updated.tags.len(), 2);

        assert!(store.delete_contact(&created.id).await.unwrap());
        assert!(store.list_contacts().await.unwrap().is_empty());
        assert!(matches!(
            store
                .update_contact(&created.id, serde_json::from_value(json!({"full_name": "x"})).unwrap())
                .await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_compliance_profile_upsert() {
        let (store, _dir) = test_store().await;
        assert!(store.get_compliance_profile("u1").await.unwrap().is_none());

        let mut profile = ComplianceProfile::standard("u1");
        store.upsert_compliance_profile(&profile).await.unwrap();
        profile.compliance_level = ComplianceLevel::Gdpr;
        profile.mfa_enabled = true;
        store.upsert_compliance_profile(&profile).await.unwrap();

        assert_eq!(
            store.get_compliance_profile("u1").await.unwrap(),
            Some(profile)
        );
    }

    #[tokio::test]
    async fn test_audit_log_newest_first() {
        let (store, _dir) = test_store().await;
        for i in 0..3 {
            let entry = AuditLogEntry::new("u1", "message", format!("m{i}"), json!({"i": i}));
            store.append_audit(&entry).await.unwrap();
        }
        store
            .append_audit(&AuditLogEntry::new("u2", "message", "x", json!(null)))
            .await
            .unwrap();

        let entries = store.list_audit(Some("u1"), 10).await.unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].action_details, "m2");
        assert_eq!(entries[0].result, json!({"i": 2}));
        assert_eq!(store.list_audit(None, 10).await.unwrap().len(), 4);
    }
}

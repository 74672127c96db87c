//! Conversation and task API handlers

use crate::api::utils::MessageResponse;
use crate::error::AppError;
use crate::services::director::conversation_title;
use crate::state::AppState;
use crate::store::models::{Conversation, Message, Task};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};

/// Filter for listing conversations
#[derive(Debug, Deserialize, Default)]
pub struct ConversationQuery {
    /// Only conversations of this session
    pub session_id: Option<String>,
}

/// Create conversation request
#[derive(Debug, Deserialize)]
pub struct CreateConversationRequest {
    /// Owning session
    #[serde(default)]
    pub session_id: Option<String>,
    /// Title; derived from `first_message` when absent
    #[serde(default)]
    pub title: Option<String>,
    /// First message, used for the title
    #[serde(default)]
    pub first_message: Option<String>,
}

/// Rename request
#[derive(Debug, Deserialize)]
pub struct UpdateTitleRequest {
    /// New title
    pub title: String,
}

/// Conversation with its messages
#[derive(Debug, Serialize)]
pub struct ConversationDetail {
    /// The conversation
    #[serde(flatten)]
    pub conversation: Conversation,
    /// Messages, oldest first
    pub messages: Vec<Message>,
}

/// Conversations list response
#[derive(Debug, Serialize)]
pub struct ConversationsListResponse {
    /// Conversations, most recent first
    pub conversations: Vec<Conversation>,
    /// Total number
    pub count: usize,
}

/// Task limit query
#[derive(Debug, Deserialize, Default)]
pub struct TaskQuery {
    /// Maximum number of tasks (default 50)
    pub limit: Option<i64>,
}

/// GET /api/conversations - List conversations
pub async fn list_conversations(
    State(state): State<AppState>,
    Query(query): Query<ConversationQuery>,
) -> Result<Json<ConversationsListResponse>, AppError> {
    let conversations = state
        .store
        .list_conversations(query.session_id.as_deref())
        .await?;
    let count = conversations.len();
    Ok(Json(ConversationsListResponse {
        conversations,
        count,
    }))
}

/// POST /api/conversations - Start a conversation
pub async fn create_conversation(
    State(state): State<AppState>,
    Json(request): Json<CreateConversationRequest>,
) -> Result<(StatusCode, Json<Conversation>), AppError> {
    let title = match (request.title, request.first_message) {
        (Some(title), _) if !title.trim().is_empty() => title.trim().to_string(),
        (_, Some(first)) => conversation_title(&first),
        _ => Conversation::UNTITLED.to_string(),
    };
    let session_id = crate::api::utils::session_or_default(request.session_id);
    let conversation = Conversation::new(session_id, title);
    state.store.create_conversation(&conversation).await?;
    Ok((StatusCode::CREATED, Json(conversation)))
}

/// GET /api/conversations/:id - Conversation with messages
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ConversationDetail>, AppError> {
    let conversation = state
        .store
        .get_conversation(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Conversation {}", id)))?;
    let messages = state.store.get_messages(&id).await?;
    Ok(Json(ConversationDetail {
        conversation,
        messages,
    }))
}

/// PUT /api/conversations/:id/title - Rename
pub async fn update_conversation_title(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateTitleRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let title = request.title.trim();
    if title.is_empty() {
        return Err(AppError::InvalidInput("Title cannot be empty".to_string()));
    }
    state.store.update_conversation_title(&id, title).await?;
    Ok(Json(MessageResponse::ok(format!("Conversation {} renamed", id))))
}

/// DELETE /api/conversations/:id - Delete with its messages
pub async fn delete_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    if !state.store.delete_conversation(&id).await? {
        return Err(AppError::NotFound(format!("Conversation {}", id)));
    }
    Ok(Json(MessageResponse::ok(format!("Conversation {} deleted", id))))
}

/// GET /api/tasks - Most recent tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<TaskQuery>,
) -> Result<Json<Vec<Task>>, AppError> {
    let limit = query.limit.unwrap_or(50).clamp(1, 500);
    Ok(Json(state.store.list_tasks(limit).await?))
}

/// GET /api/tasks/:id - One task
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Task>, AppError> {
    state
        .store
        .get_task(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Task {}", id)))
}

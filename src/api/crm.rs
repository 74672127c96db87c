//! CRM contact and content calendar handlers

use crate::api::utils::MessageResponse;
use crate::error::AppError;
use crate::roles::actions::{add_contact, add_to_content_calendar, CalendarOutcome, ContactOutcome};
use crate::state::AppState;
use crate::store::models::{Contact, ContentCalendarEntry, NewContact, NewContentEntry};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};

fn require_text(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidInput(format!("{} cannot be empty", field)));
    }
    Ok(())
}

/// GET /api/contacts - List contacts
pub async fn list_contacts(State(state): State<AppState>) -> Result<Json<Vec<Contact>>, AppError> {
    Ok(Json(state.store.list_contacts().await?))
}

/// POST /api/contacts - Add a contact
pub async fn create_contact(
    State(state): State<AppState>,
    Json(request): Json<NewContact>,
) -> Result<(StatusCode, Json<ContactOutcome>), AppError> {
    require_text(&request.full_name, "full_name")?;
    let outcome = add_contact(&state.store, request).await;
    let status = if outcome.success {
        StatusCode::CREATED
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    Ok((status, Json(outcome)))
}

/// PUT /api/contacts/:id - Replace a contact
pub async fn update_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<NewContact>,
) -> Result<Json<Contact>, AppError> {
    require_text(&request.full_name, "full_name")?;
    Ok(Json(state.store.update_contact(&id, request).await?))
}

/// DELETE /api/contacts/:id - Remove a contact
pub async fn delete_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    if !state.store.delete_contact(&id).await? {
        return Err(AppError::NotFound(format!("Contact {}", id)));
    }
    Ok(Json(MessageResponse::ok(format!("Contact {} deleted", id))))
}

/// GET /api/content-calendar - Scheduled content
pub async fn list_content(
    State(state): State<AppState>,
) -> Result<Json<Vec<ContentCalendarEntry>>, AppError> {
    Ok(Json(state.store.list_content_entries().await?))
}

/// POST /api/content-calendar - Schedule content
pub async fn create_content(
    State(state): State<AppState>,
    Json(request): Json<NewContentEntry>,
) -> Result<(StatusCode, Json<CalendarOutcome>), AppError> {
    require_text(&request.title, "title")?;
    let outcome = add_to_content_calendar(&state.store, request).await;
    let status = if outcome.success {
        StatusCode::CREATED
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    Ok((status, Json(outcome)))
}

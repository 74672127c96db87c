//! Power-up handlers

use crate::api::utils::session_or_default;
use crate::error::AppError;
use crate::powerups::template_variables;
use crate::services::DirectorReply;
use crate::state::AppState;
use crate::store::models::{NewPowerUp, PowerUp};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Power-up with the variables its template expects
#[derive(Debug, Serialize)]
pub struct PowerUpResponse {
    /// The power-up
    #[serde(flatten)]
    pub powerup: PowerUp,
    /// Placeholder names, in order
    pub variables: Vec<String>,
}

impl From<PowerUp> for PowerUpResponse {
    fn from(powerup: PowerUp) -> Self {
        let variables = template_variables(&powerup.prompt_template);
        Self { powerup, variables }
    }
}

/// Execute body
#[derive(Debug, Deserialize, Default)]
pub struct ExecutePowerUpRequest {
    /// Placeholder values
    #[serde(default)]
    pub inputs: HashMap<String, String>,
    /// Session (defaults to "default")
    #[serde(default)]
    pub session_id: Option<String>,
    /// User, for compliance and audit
    #[serde(default)]
    pub user_id: Option<String>,
}

/// GET /api/powerups - List power-ups
pub async fn list_powerups(
    State(state): State<AppState>,
) -> Result<Json<Vec<PowerUpResponse>>, AppError> {
    let powerups = state.store.list_powerups().await?;
    Ok(Json(powerups.into_iter().map(PowerUpResponse::from).collect()))
}

/// POST /api/powerups - Save a power-up
pub async fn create_powerup(
    State(state): State<AppState>,
    Json(request): Json<NewPowerUp>,
) -> Result<(StatusCode, Json<PowerUpResponse>), AppError> {
    if request.name.trim().is_empty() {
        return Err(AppError::InvalidInput("name cannot be empty".to_string()));
    }
    if request.prompt_template.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "prompt_template cannot be empty".to_string(),
        ));
    }
    let powerup = state.store.create_powerup(request).await?;
    Ok((StatusCode::CREATED, Json(powerup.into())))
}

/// POST /api/powerups/:id/execute - Fill the template and run it as a message
pub async fn execute_powerup(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ExecutePowerUpRequest>,
) -> Result<Json<DirectorReply>, AppError> {
    let session_id = session_or_default(request.session_id);
    let reply = state
        .director
        .execute_powerup(&id, &session_id, request.user_id.as_deref(), &request.inputs)
        .await?;
    Ok(Json(reply))
}

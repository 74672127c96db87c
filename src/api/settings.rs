//! Orchestrator configuration handlers

use crate::error::AppError;
use crate::orchestrator::config::{
    validate_and_apply_config_update, ConfigUpdateRequest, OrchestratorConfig,
};
use crate::state::AppState;
use axum::{extract::State, response::Json};

/// GET /api/config - Current orchestrator configuration
pub async fn get_config(State(state): State<AppState>) -> Json<OrchestratorConfig> {
    Json(state.config.read().await.clone())
}

/// POST /api/config - Update the tunable fields
///
/// All-or-nothing: an invalid field leaves the configuration untouched.
pub async fn update_config(
    State(state): State<AppState>,
    Json(request): Json<ConfigUpdateRequest>,
) -> Result<Json<OrchestratorConfig>, AppError> {
    let mut config = state.config.write().await;
    let updated = validate_and_apply_config_update(config.clone(), request)?;
    *config = updated.clone();
    tracing::info!(
        max_request_length = updated.max_request_length,
        max_history_turns = updated.max_history_turns,
        "Orchestrator configuration updated"
    );
    Ok(Json(updated))
}

//! Compliance profile and audit log handlers

use crate::compliance::{ComplianceChecklist, ComplianceLevel};
use crate::error::AppError;
use crate::state::AppState;
use crate::store::models::{AuditLogEntry, ComplianceProfile};
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;

/// Profile update body
#[derive(Debug, Deserialize)]
pub struct ProfileUpdateRequest {
    /// Regulatory regime
    pub compliance_level: ComplianceLevel,
    /// MFA flag
    #[serde(default)]
    pub mfa_enabled: bool,
}

/// Audit log filter
#[derive(Debug, Deserialize, Default)]
pub struct AuditQuery {
    /// Only entries of this user
    pub user_id: Option<String>,
    /// Maximum number of entries (default 100)
    pub limit: Option<i64>,
}

/// GET /api/compliance/:user_id - Profile, or the standard one if unset
pub async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ComplianceProfile>, AppError> {
    let profile = state
        .store
        .get_compliance_profile(&user_id)
        .await?
        .unwrap_or_else(|| ComplianceProfile::standard(user_id));
    Ok(Json(profile))
}

/// PUT /api/compliance/:user_id - Set a profile
pub async fn update_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<ProfileUpdateRequest>,
) -> Result<Json<ComplianceProfile>, AppError> {
    let profile = ComplianceProfile {
        user_id,
        compliance_level: request.compliance_level,
        mfa_enabled: request.mfa_enabled,
    };
    state.store.upsert_compliance_profile(&profile).await?;
    tracing::info!(user_id = %profile.user_id, level = %profile.compliance_level, "Compliance profile updated");
    Ok(Json(profile))
}

/// GET /api/compliance/levels/:level - Static checklist of a level
pub async fn get_checklist(Path(level): Path<String>) -> Result<Json<ComplianceChecklist>, AppError> {
    let level: ComplianceLevel = level
        .parse()
        .map_err(|_| AppError::NotFound(format!("Compliance level {}", level)))?;
    Ok(Json(level.checklist()))
}

/// GET /api/audit - Audit log, newest first
pub async fn list_audit(
    State(state): State<AppState>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Vec<AuditLogEntry>>, AppError> {
    let limit = query.limit.unwrap_or(100).clamp(1, 1000);
    Ok(Json(
        state
            .store
            .list_audit(query.user_id.as_deref(), limit)
            .await?,
    ))
}

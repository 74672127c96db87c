//! Role API handlers
//!
//! Listing roles, running a single role directly, agent matching and the
//! graphic design image passthrough.

use crate::api::utils::validate_request;
use crate::error::AppError;
use crate::orchestrator::OrchestrationError;
use crate::roles::actions::{generate_image, ImageOutcome};
use crate::roles::contracts::{AgentMatch, DesignSpec};
use crate::roles::coordinator::{agent_expertise, find_best_agent};
use crate::roles::Role;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One role as listed by the API
#[derive(Debug, Serialize)]
pub struct RoleResponse {
    /// Exact role name
    pub name: &'static str,
    /// "director", "manager" or "agent"
    pub kind: &'static str,
    /// Expertise tags
    pub expertise: &'static [&'static str],
}

impl From<Role> for RoleResponse {
    fn from(role: Role) -> Self {
        Self {
            name: role.name(),
            kind: role.kind(),
            expertise: agent_expertise(role),
        }
    }
}

/// Roles list response
#[derive(Debug, Serialize)]
pub struct RolesListResponse {
    /// Every role
    pub roles: Vec<RoleResponse>,
    /// Total number of roles
    pub count: usize,
}

/// Task for a role or for matching
#[derive(Debug, Deserialize)]
pub struct RoleTaskRequest {
    /// Task text
    pub task: String,
    /// Arbitrary context
    #[serde(default)]
    pub context: Value,
}

/// Output of a direct role execution
#[derive(Debug, Serialize)]
pub struct RoleExecutionResponse {
    /// Role that ran
    pub role: Role,
    /// Contract-shaped result
    pub result: Value,
}

/// GET /api/roles - List all roles
pub async fn list_roles() -> Json<RolesListResponse> {
    let roles: Vec<RoleResponse> = Role::all().into_iter().map(RoleResponse::from).collect();
    let count = roles.len();
    Json(RolesListResponse { roles, count })
}

/// POST /api/roles/:name/execute - Run one role executor
pub async fn execute_role(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<RoleTaskRequest>,
) -> Result<Json<RoleExecutionResponse>, AppError> {
    let role: Role = name
        .parse()
        .map_err(|_| OrchestrationError::UnknownRole(name.clone()))?;
    let max_len = state.config.read().await.max_request_length;
    validate_request(&request.task, max_len)?;

    let executor = state
        .director
        .orchestrator()
        .registry()
        .get(role)
        .ok_or_else(|| OrchestrationError::UnknownRole(name.clone()))?;

    let context = if request.context.is_null() {
        Value::Object(Default::default())
    } else {
        request.context
    };
    let result = executor.execute(request.task.trim(), &context).await?;
    Ok(Json(RoleExecutionResponse { role, result }))
}

/// POST /api/roles/match - Best agent(s) for a task
pub async fn match_agents(
    State(state): State<AppState>,
    Json(request): Json<RoleTaskRequest>,
) -> Result<Json<AgentMatch>, AppError> {
    let max_len = state.config.read().await.max_request_length;
    validate_request(&request.task, max_len)?;
    let matched = find_best_agent(state.gateway.as_ref(), request.task.trim(), &request.context).await?;
    Ok(Json(matched))
}

/// POST /api/design/image - Render a design spec's image prompt
pub async fn generate_design_image(
    State(state): State<AppState>,
    Json(design_spec): Json<DesignSpec>,
) -> (StatusCode, Json<ImageOutcome>) {
    let outcome = generate_image(state.images.as_ref(), design_spec).await;
    let status = if outcome.success {
        StatusCode::OK
    } else {
        StatusCode::BAD_GATEWAY
    };
    (status, Json(outcome))
}

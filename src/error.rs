//! Error types and error handling for the application
//!
//! This module defines the HTTP-facing error type. Every variant converts to
//! a JSON response of the form `{"error": msg, "status": code}`.

use crate::gateway::GatewayError;
use crate::orchestrator::OrchestrationError;
use crate::store::models::TaskStatus;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Entity with the given id was not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request payload failed validation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The session is already processing a message
    #[error("Session busy: {0}")]
    SessionBusy(String),

    /// Task status change that would break the lifecycle
    #[error("Invalid task transition from {from} to {to}")]
    InvalidTransition {
        /// Current status
        from: TaskStatus,
        /// Requested status
        to: TaskStatus,
    },

    /// Database failure
    #[error("Database error: {0}")]
    Database(String),

    /// Orchestration failed
    #[error("Orchestration error: {0}")]
    Orchestration(#[from] OrchestrationError),

    /// A direct LLM call failed
    #[error("LLM gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Internal server error (catch-all for unexpected errors)
    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

fn gateway_status(error: &GatewayError) -> StatusCode {
    match error {
        GatewayError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        GatewayError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        GatewayError::MissingApiKey => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::BAD_GATEWAY,
    }
}

impl AppError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::SessionBusy(_) => StatusCode::CONFLICT,
            AppError::InvalidTransition { .. } => StatusCode::CONFLICT,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Orchestration(OrchestrationError::UnknownRole(_)) => StatusCode::BAD_REQUEST,
            AppError::Orchestration(OrchestrationError::Gateway(e)) => gateway_status(e),
            AppError::Orchestration(OrchestrationError::RoutingFailed) => StatusCode::BAD_GATEWAY,
            AppError::Gateway(e) => gateway_status(e),
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "{}", self);
        }

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::SessionBusy("default".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Gateway(GatewayError::Timeout(60)).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            AppError::Orchestration(OrchestrationError::RoutingFailed).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::NotFound("Task x".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
    }
}

//! Orchestration errors

use crate::gateway::GatewayError;
use thiserror::Error;

/// Failure of a single orchestration run
#[derive(Debug, Error)]
pub enum OrchestrationError {
    /// Both the routing call and its fallback failed
    #[error("Could not determine which director should handle this request.")]
    RoutingFailed,

    /// The execution order named a role with no registered executor
    #[error("No executor registered for role: {0}")]
    UnknownRole(String),

    /// A role execution or the synthesis call failed
    #[error("{0}")]
    Gateway(#[from] GatewayError),
}

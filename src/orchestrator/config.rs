//! Orchestrator configuration
//!
//! Runtime-tunable settings, exposed through `GET/POST /api/config`.

use crate::error::AppError;
use serde::{Deserialize, Serialize};

/// Orchestrator configuration
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OrchestratorConfig {
    /// Gemini model name (read-only at runtime)
    pub gemini_model: String,
    /// Per-call gateway timeout in seconds (read-only at runtime)
    pub gemini_timeout_secs: u64,
    /// Maximum request length in characters
    pub max_request_length: usize,
    /// Prior conversation turns included in the routing prompt
    pub max_history_turns: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            gemini_model: "gemini-2.5-flash".to_string(),
            gemini_timeout_secs: 60,
            max_request_length: 10000, // 10KB
            max_history_turns: 20,
        }
    }
}

/// Request body for updating orchestrator configuration
#[derive(Debug, Deserialize, Default)]
pub struct ConfigUpdateRequest {
    /// Maximum request length in characters (optional)
    pub max_request_length: Option<usize>,
    /// Prior turns in the routing prompt (optional)
    pub max_history_turns: Option<usize>,
}

/// Validate and apply configuration updates
///
/// Nothing is applied if any field is invalid.
pub fn validate_and_apply_config_update(
    mut config: OrchestratorConfig,
    request: ConfigUpdateRequest,
) -> Result<OrchestratorConfig, AppError> {
    if let Some(max_len) = request.max_request_length {
        if max_len == 0 {
            return Err(AppError::InvalidInput(
                "max_request_length must be > 0".to_string(),
            ));
        }
        config.max_request_length = max_len;
    }

    if let Some(turns) = request.max_history_turns {
        if turns > 200 {
            return Err(AppError::InvalidInput(
                "max_history_turns must be <= 200".to_string(),
            ));
        }
        config.max_history_turns = turns;
    }

    Ok(config)
}

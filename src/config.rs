//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults.

use crate::orchestrator::config::OrchestratorConfig;
use crate::session::DEFAULT_ACTIVITY_CAPACITY;
use std::env;
use std::fmt;
use std::str::FromStr;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Persistence configuration
    pub persistence: PersistenceConfig,
    /// LLM provider configuration
    pub llm: LlmConfig,
    /// Orchestration limits
    pub orchestration: OrchestrationConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host address to bind to
    pub host: String,
}

/// Persistence configuration
#[derive(Debug, Clone)]
pub struct PersistenceConfig {
    /// SQLite database path or `sqlite:` URL
    pub database_url: String,
}

/// LLM provider configuration
#[derive(Clone)]
pub struct LlmConfig {
    /// Gemini API key
    pub api_key: Option<String>,
    /// Text model
    pub model: String,
    /// Image model
    pub image_model: String,
    /// Per-call timeout in seconds
    pub timeout_secs: u64,
    /// Use the offline gateway instead of the provider
    pub offline: bool,
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("model", &self.model)
            .field("image_model", &self.image_model)
            .field("timeout_secs", &self.timeout_secs)
            .field("offline", &self.offline)
            .finish()
    }
}

impl LlmConfig {
    /// Whether calls should go to the offline gateway
    pub fn use_offline(&self) -> bool {
        self.offline || self.api_key.as_deref().map_or(true, |k| k.trim().is_empty())
    }
}

/// Orchestration limits
#[derive(Debug, Clone)]
pub struct OrchestrationConfig {
    /// Maximum request length in characters
    pub max_request_length: usize,
    /// Activity entries kept per session
    pub activity_capacity: usize,
}

fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn default_database_path() -> String {
    let data_dir = env::var("DATA_DIR").unwrap_or_else(|_| {
        // Default to ~/.director-backend or current directory
        if let Some(home) = env::var_os("HOME") {
            format!("{}/.director-backend", home.to_string_lossy())
        } else {
            ".director-backend".to_string()
        }
    });
    format!("{}/director.db", data_dir)
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                port: parse_env("PORT", 8080),
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            },
            persistence: PersistenceConfig {
                database_url: env::var("DATABASE_URL").unwrap_or_else(|_| default_database_path()),
            },
            llm: LlmConfig {
                api_key: env::var("GEMINI_API_KEY").ok(),
                model: env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".to_string()),
                image_model: env::var("GEMINI_IMAGE_MODEL")
                    .unwrap_or_else(|_| "gemini-2.5-flash-image".to_string()),
                timeout_secs: parse_env("GEMINI_TIMEOUT_SECS", 60),
                offline: env::var("LLM_OFFLINE")
                    .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                    .unwrap_or(false),
            },
            orchestration: OrchestrationConfig {
                max_request_length: parse_env("MAX_REQUEST_LENGTH", 10000),
                activity_capacity: parse_env("ACTIVITY_CAPACITY", DEFAULT_ACTIVITY_CAPACITY),
            },
        }
    }

    /// Get the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Initial runtime orchestrator settings
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            gemini_model: self.llm.model.clone(),
            gemini_timeout_secs: self.llm.timeout_secs,
            max_request_length: self.orchestration.max_request_length,
            ..OrchestratorConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_defaults_and_overrides() {
        env::set_var("PORT", "9191");
        env::set_var("GEMINI_TIMEOUT_SECS", "not-a-number");
        env::remove_var("GEMINI_API_KEY");
        env::remove_var("LLM_OFFLINE");

        let config = Config::from_env();
        assert_eq!(config.server.port, 9191);
        assert_eq!(config.llm.timeout_secs, 60);
        assert!(config.llm.use_offline());
        assert!(config.persistence.database_url.ends_with("director.db"));

        env::remove_var("PORT");
        env::remove_var("GEMINI_TIMEOUT_SECS");
    }

    #[test]
    fn test_debug_masks_api_key() {
        let llm = LlmConfig {
            api_key: Some("secret-key".to_string()),
            model: "m".to_string(),
            image_model: "i".to_string(),
            timeout_secs: 1,
            offline: false,
        };
        let printed = format!("{:?}", llm);
        assert!(!printed.contains("secret-key"));
        assert!(!llm.use_offline());
    }
}

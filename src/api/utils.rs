//! API utility functions
//!
//! Shared request shapes, session defaults and SSE framing.

use crate::error::AppError;
use crate::orchestrator::constants::SSE_ERROR_PREFIX;
use axum::{
    body::Body,
    http::{header, StatusCode},
    response::Response,
};
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

pub use crate::services::director::validate_request;

/// Session used when a request does not name one
pub const DEFAULT_SESSION_ID: &str = "default";

/// Session id from an optional request field
pub fn session_or_default(session_id: Option<String>) -> String {
    session_id
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SESSION_ID.to_string())
}

/// `?session_id=` query parameter
#[derive(Debug, Deserialize, Default)]
pub struct SessionQuery {
    /// Session to read
    pub session_id: Option<String>,
}

/// Message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Human-readable message
    pub message: String,
    /// Status indicator (e.g., "ok", "error")
    pub status: String,
}

impl MessageResponse {
    /// "ok" response with `message`
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: "ok".to_string(),
        }
    }
}

/// Wrap a stream of event payloads as a `text/event-stream` response
///
/// Each `Ok` item becomes one `data:` frame; an `Err` becomes an
/// `[ERROR]`-prefixed frame.
pub fn sse_response(
    stream: impl Stream<Item = Result<String, AppError>> + Send + 'static,
) -> Result<Response, AppError> {
    let sse_stream = stream.map(|event_result| {
        let sse_text = match event_result {
            Ok(data) => format!("data: {}\n\n", data),
            Err(e) => format!("data: {} {}\n\n", SSE_ERROR_PREFIX, e),
        };
        Ok::<_, std::io::Error>(sse_text)
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .body(Body::from_stream(sse_stream))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build SSE response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_or_default() {
        assert_eq!(session_or_default(None), "default");
        assert_eq!(session_or_default(Some("  ".to_string())), "default");
        assert_eq!(session_or_default(Some("abc".to_string())), "abc");
    }
}

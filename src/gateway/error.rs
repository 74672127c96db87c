//! Gateway-specific error types
//!
//! Errors that can occur while calling the external LLM completion service
//! (transport failures, provider rejections, contract violations).

use thiserror::Error;

/// Errors returned by an [`LlmGateway`](super::LlmGateway) call
#[derive(Error, Debug)]
pub enum GatewayError {
    /// No API key was configured for the provider
    #[error("LLM API key is empty")]
    MissingApiKey,

    /// The HTTP request could not be sent or the body could not be read
    #[error("Failed to reach LLM provider: {0}")]
    Transport(String),

    /// The provider did not answer within the configured timeout
    #[error("LLM call timed out after {0} seconds")]
    Timeout(u64),

    /// The provider rejected the call because of rate limiting (HTTP 429)
    #[error("LLM provider rate limit exceeded: {0}")]
    RateLimited(String),

    /// The provider returned a non-success status
    #[error("LLM provider returned error status {status}: {body}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// The provider blocked the prompt
    #[error("LLM provider blocked the prompt: {0}")]
    Blocked(String),

    /// The provider answered without any usable content
    #[error("LLM response contains no content: {0}")]
    EmptyResponse(String),

    /// The provider envelope could not be decoded
    #[error("Failed to parse LLM provider response: {0}")]
    Decode(String),

    /// A structured call returned data that does not match the response contract
    #[error("LLM response does not match the expected schema: {0}")]
    SchemaViolation(String),

    /// A structured call was answered with free text, or the reverse
    #[error("LLM returned {actual} where {expected} was expected")]
    UnexpectedShape {
        /// Shape the caller asked for
        expected: &'static str,
        /// Shape the gateway produced
        actual: &'static str,
    },
}

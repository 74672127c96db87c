//! Orchestrator constants

/// Actor name used for orchestrator activity and replies
pub const ORCHESTRATOR_ACTOR: &str = "Master Orchestrator";

/// SSE stream termination signal
pub const SSE_DONE_SIGNAL: &str = "[DONE]";

/// SSE error prefix
pub const SSE_ERROR_PREFIX: &str = "[ERROR]";

/// Reply sent when no director could be chosen
pub const ROUTING_FAILED_REPLY: &str = "I couldn't determine how to handle this request. \
Could you rephrase it or add a little more detail about what you need?";

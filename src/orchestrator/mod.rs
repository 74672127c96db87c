//! Orchestrator module
//!
//! Routes a user request to one or more directors, runs them sequentially
//! and synthesizes a single reply.

pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod prompts;
pub mod router;
pub mod utils;

pub use engine::{Orchestrator, RunFailure, RunOutcome};
pub use error::OrchestrationError;
pub use prompts::ConversationTurn;
pub use router::{ComplexityLevel, RoutingDecision};

//! Director Backend Library
//!
//! Multi-agent orchestration: a master orchestrator routes each user request
//! to one of six directors, runs them in order against an LLM gateway and
//! synthesizes a single reply. The HTTP server binary is in `src/main.rs`.

pub mod api;
pub mod compliance;
pub mod config;
pub mod error;
pub mod gateway;
pub mod orchestrator;
pub mod powerups;
pub mod roles;
pub mod services;
pub mod session;
/// Application state management
///
/// Shared handles (store, gateways, sessions, runtime config) for handlers.
pub mod state;
pub mod store;
pub mod websocket;

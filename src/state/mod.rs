// State management module
// Shared handles passed to every HTTP handler

/// Shared application state
pub mod app_state;

pub use app_state::AppState;

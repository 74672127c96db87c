//! API module
//!
//! Contains HTTP request handlers for the director backend endpoints

pub mod compliance;
pub mod conversations;
pub mod crm;
pub mod director;
pub mod powerups;
pub mod roles;
pub mod settings;
pub mod utils;

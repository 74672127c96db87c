//! Persistence layer

pub mod db;
pub mod models;

pub use db::Store;

//! Filter Cache - persistent caching and URL-synchronized filter state
//!
//! Provides a TTL cache over an injectable key-value store, read-through
//! fetching with last-initiated-wins semantics, filter scopes kept in step
//! with the query string, and theme palette generation.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod filters;
pub mod models;
pub mod store;
pub mod tasks;
pub mod theme;

pub use api::AppState;
pub use config::Config;
pub use tasks::spawn_cleanup_task;

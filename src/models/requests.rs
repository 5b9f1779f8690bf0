//! Request DTOs for the state service API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;
use serde_json::Value;

/// Request body for writing a cache entry (PUT /cache/:key)
///
/// # Fields
/// - `data`: Arbitrary JSON payload to cache
#[derive(Debug, Clone, Deserialize)]
pub struct WriteRequest {
    pub data: Value,
}

/// Query parameters for bulk clearing (DELETE /cache)
///
/// Without a prefix the whole store is wiped.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClearQuery {
    #[serde(default)]
    pub prefix: Option<String>,
}

/// Validates a cache key taken from the path.
///
/// Returns an error message if validation fails, None if valid.
pub fn validate_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > 256 {
        return Some("Key exceeds maximum length of 256 characters".to_string());
    }
    None
}

//! Cache Entry Module
//!
//! Defines the persisted record format: `{"data": <T>, "timestamp": <ms>}`.
//! The layout is stored by long-lived clients and must stay stable.

use serde::{Deserialize, Serialize};

// == Cache Entry ==
/// A cached payload with the instant it was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// The stored payload
    pub data: T,
    /// Write timestamp (Unix milliseconds)
    pub timestamp: i64,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    pub fn new(data: T, timestamp: i64) -> Self {
        Self { data, timestamp }
    }

    // == Is Valid ==
    /// Checks whether the entry is still fresh at `now_ms`.
    ///
    /// Boundary condition: an entry whose age equals the TTL is already
    /// stale, so `valid <=> now - timestamp < ttl`.
    pub fn is_valid(&self, now_ms: i64, ttl_ms: i64) -> bool {
        now_ms.saturating_sub(self.timestamp) < ttl_ms
    }

    // == Time To Live ==
    /// Remaining lifetime in milliseconds, `0` once stale.
    pub fn ttl_remaining_ms(&self, now_ms: i64, ttl_ms: i64) -> i64 {
        (self.timestamp.saturating_add(ttl_ms) - now_ms).max(0)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_serialized_layout() {
        let entry = CacheEntry::new(json!({"chains": [1, 137]}), 1_700_000_000_000);
        let raw = serde_json::to_value(&entry).unwrap();

        assert_eq!(
            raw,
            json!({"data": {"chains": [1, 137]}, "timestamp": 1_700_000_000_000i64})
        );
    }

    #[test]
    fn test_entry_parses_existing_record() {
        let raw = r#"{"data":[{"id":1,"name":"Ethereum"}],"timestamp":1700000000000}"#;
        let entry: CacheEntry<serde_json::Value> = serde_json::from_str(raw).unwrap();

        assert_eq!(entry.timestamp, 1_700_000_000_000);
        assert_eq!(entry.data[0]["name"], "Ethereum");
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry::new("v", 1_000);

        assert!(entry.is_valid(1_000, 500));
        assert!(entry.is_valid(1_499, 500));
        assert!(!entry.is_valid(1_500, 500), "age == ttl must be stale");
        assert!(!entry.is_valid(9_999, 500));
    }

    #[test]
    fn test_ttl_remaining() {
        let entry = CacheEntry::new("v", 1_000);

        assert_eq!(entry.ttl_remaining_ms(1_200, 500), 300);
        assert_eq!(entry.ttl_remaining_ms(2_000, 500), 0);
    }
}

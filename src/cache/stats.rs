//! Cache Statistics Module
//!
//! Tracks cache activity: hits, misses, writes, discarded entries and
//! absorbed storage failures.

use serde::Serialize;

// == Cache Stats ==
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Reads that returned a valid entry
    pub hits: u64,
    /// Reads that found nothing, a stale entry, or a corrupt one
    pub misses: u64,
    /// Successful writes to the store
    pub writes: u64,
    /// Entries removed because their TTL had elapsed
    pub expirations: u64,
    /// Entries removed because they did not parse as a cache record
    pub corrupt: u64,
    /// Store failures that were logged and absorbed
    pub storage_errors: u64,
    /// Current number of keys in the store
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_write(&mut self) {
        self.writes += 1;
    }

    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }

    pub fn record_corrupt(&mut self) {
        self.corrupt += 1;
    }

    pub fn record_storage_error(&mut self) {
        self.storage_errors += 1;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}

//! Keyed Cache Module
//!
//! Read-through, TTL-bounded cache over an injected [`KeyValueStore`].
//! Storage failures never reach the caller: they are logged and degrade to
//! cache-miss behaviour. Only fetcher errors without a fallback propagate.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{CacheEntry, CacheStats, Clock, SystemClock};
use crate::error::{CacheError, Result};
use crate::store::KeyValueStore;

// == Resolution Source ==
/// Where a value returned by [`KeyedCache::get_or_fetch`] came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A valid cache entry
    Cache,
    /// A successful fetcher call, now cached
    Fetched,
    /// The fetcher failed; the fallback was substituted and cached
    Fallback { error: String },
}

/// A value plus its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub value: T,
    pub source: Source,
}

impl<T> Resolved<T> {
    pub fn into_value(self) -> T {
        self.value
    }

    /// The swallowed fetcher error, when the fallback was used.
    pub fn fallback_error(&self) -> Option<&str> {
        match &self.source {
            Source::Fallback { error } => Some(error),
            _ => None,
        }
    }
}

// == Keyed Cache ==
/// TTL cache over a shared key-value store.
///
/// Cloning is cheap; clones share the store, clock and statistics.
#[derive(Clone)]
pub struct KeyedCache {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    stats: Arc<Mutex<CacheStats>>,
    ttl_ms: i64,
}

impl fmt::Debug for KeyedCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedCache")
            .field("ttl_ms", &self.ttl_ms)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl KeyedCache {
    // == Constructor ==
    /// Creates a cache over `store` using the wall clock.
    pub fn new(store: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self::with_clock(store, ttl, Arc::new(SystemClock))
    }

    /// Creates a cache with an explicit time source.
    pub fn with_clock(store: Arc<dyn KeyValueStore>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            stats: Arc::new(Mutex::new(CacheStats::new())),
            ttl_ms: i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX),
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms as u64)
    }

    fn record(&self, update: impl FnOnce(&mut CacheStats)) {
        if let Ok(mut stats) = self.stats.lock() {
            update(&mut stats);
        }
    }

    fn storage_failed(&self, op: &str, key: &str, err: &CacheError) {
        warn!("Cache {} failed for '{}': {}", op, key, err);
        self.record(CacheStats::record_storage_error);
    }

    /// Removes an entry that is stale or unreadable, counting it with `tally`.
    fn discard(&self, key: &str, tally: fn(&mut CacheStats)) {
        self.record(tally);
        if let Err(e) = self.store.remove(key) {
            self.storage_failed("remove", key, &e);
        }
    }

    fn raw(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(raw) => raw,
            Err(e) => {
                self.storage_failed("read", key, &e);
                None
            }
        }
    }

    // == Read ==
    /// Returns the cached payload for `key` if present and fresh.
    ///
    /// Never fails. Entries that are stale or do not parse as
    /// `CacheEntry<T>` are removed and reported as a miss.
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let Some(raw) = self.raw(key) else {
            self.record(CacheStats::record_miss);
            return None;
        };

        match serde_json::from_str::<CacheEntry<T>>(&raw) {
            Ok(entry) if entry.is_valid(self.clock.now_ms(), self.ttl_ms) => {
                self.record(CacheStats::record_hit);
                Some(entry.data)
            }
            Ok(_) => {
                debug!("Cache entry '{}' expired", key);
                self.discard(key, CacheStats::record_expiration);
                self.record(CacheStats::record_miss);
                None
            }
            Err(e) => {
                warn!("Discarding malformed cache entry '{}': {}", key, e);
                self.discard(key, CacheStats::record_corrupt);
                self.record(CacheStats::record_miss);
                None
            }
        }
    }

    // == Has ==
    /// Checks whether a fresh entry exists, purging it if stale or corrupt.
    ///
    /// Does not touch hit/miss counters.
    pub fn has(&self, key: &str) -> bool {
        let Some(raw) = self.raw(key) else {
            return false;
        };

        match serde_json::from_str::<CacheEntry<Value>>(&raw) {
            Ok(entry) if entry.is_valid(self.clock.now_ms(), self.ttl_ms) => true,
            Ok(_) => {
                self.discard(key, CacheStats::record_expiration);
                false
            }
            Err(_) => {
                self.discard(key, CacheStats::record_corrupt);
                false
            }
        }
    }

    // == Write ==
    /// Stores `data` under `key` with a fresh timestamp.
    ///
    /// Overwrites unconditionally. Returns whether the store accepted the
    /// write; failures are logged, never propagated.
    pub fn write<T: Serialize + ?Sized>(&self, key: &str, data: &T) -> bool {
        let entry = CacheEntry::new(data, self.clock.now_ms());
        let raw = match serde_json::to_string(&entry) {
            Ok(raw) => raw,
            Err(e) => {
                self.storage_failed("serialize", key, &CacheError::from(e));
                return false;
            }
        };

        match self.store.set(key, &raw) {
            Ok(()) => {
                self.record(CacheStats::record_write);
                true
            }
            Err(e) => {
                self.storage_failed("write", key, &e);
                false
            }
        }
    }

    // == Invalidate ==
    /// Deletes the entry for `key`. Idempotent.
    pub fn invalidate(&self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            self.storage_failed("invalidate", key, &e);
        }
    }

    // == Get Or Fetch ==
    /// Returns the cached value or produces it with `fetcher`.
    ///
    /// On a miss the fetcher result is written and returned. If the fetcher
    /// fails and a `fallback` is supplied, the fallback is written and
    /// returned with the swallowed error attached to its [`Source`].
    pub async fn get_or_fetch<T, F, Fut>(
        &self,
        key: &str,
        fetcher: F,
        fallback: Option<T>,
    ) -> Result<Resolved<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        if let Some(value) = self.read::<T>(key) {
            return Ok(Resolved {
                value,
                source: Source::Cache,
            });
        }

        match fetcher().await {
            Ok(value) => {
                self.write(key, &value);
                Ok(Resolved {
                    value,
                    source: Source::Fetched,
                })
            }
            Err(e) => {
                let error = format!("{:#}", e);
                match fallback {
                    Some(value) => {
                        warn!("Fetch for '{}' failed, using fallback: {}", key, error);
                        self.write(key, &value);
                        Ok(Resolved {
                            value,
                            source: Source::Fallback { error },
                        })
                    }
                    None => Err(CacheError::Fetch(error)),
                }
            }
        }
    }

    // == Bulk Operations ==
    /// Removes every entry whose key starts with `prefix`.
    ///
    /// Returns the number of keys removed.
    pub fn clear_by_prefix(&self, prefix: &str) -> usize {
        let keys = match self.store.keys() {
            Ok(keys) => keys,
            Err(e) => {
                self.storage_failed("enumerate", prefix, &e);
                return 0;
            }
        };

        let mut removed = 0;
        for key in keys.iter().filter(|k| k.starts_with(prefix)) {
            match self.store.remove(key) {
                Ok(()) => removed += 1,
                Err(e) => self.storage_failed("remove", key, &e),
            }
        }
        debug!("Cleared {} entries with prefix '{}'", removed, prefix);
        removed
    }

    /// Wipes the entire backing store, including keys written by other
    /// components sharing it.
    pub fn clear_all(&self) {
        match self.store.clear() {
            Ok(()) => warn!("Cache store cleared"),
            Err(e) => self.storage_failed("clear", "*", &e),
        }
    }

    // == Purge Expired ==
    /// Removes all stale or malformed entries.
    ///
    /// Every key in the store is expected to hold a cache record; anything
    /// that does not parse as one is removed too.
    pub fn purge_expired(&self) -> usize {
        let keys = match self.store.keys() {
            Ok(keys) => keys,
            Err(e) => {
                self.storage_failed("enumerate", "*", &e);
                return 0;
            }
        };

        let now = self.clock.now_ms();
        let mut removed = 0;
        for key in keys {
            let Some(raw) = self.raw(&key) else {
                continue;
            };
            let tally: fn(&mut CacheStats) = match serde_json::from_str::<CacheEntry<Value>>(&raw) {
                Ok(entry) if entry.is_valid(now, self.ttl_ms) => continue,
                Ok(_) => CacheStats::record_expiration,
                Err(_) => CacheStats::record_corrupt,
            };
            self.discard(&key, tally);
            removed += 1;
        }
        removed
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self
            .stats
            .lock()
            .map(|stats| stats.clone())
            .unwrap_or_default();
        stats.set_total_entries(self.store.keys().map(|k| k.len()).unwrap_or(0));
        stats
    }
}

//! Persisted Value Module
//!
//! Typed handle over a single cache key, for plain key-value use without a
//! fetcher.

use std::fmt;
use std::marker::PhantomData;

use serde::{de::DeserializeOwned, Serialize};

use crate::cache::KeyedCache;

// == Persisted Value ==
pub struct PersistedValue<T> {
    cache: KeyedCache,
    key: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for PersistedValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistedValue").field("key", &self.key).finish()
    }
}

impl<T> Clone for PersistedValue<T> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            key: self.key.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Serialize + DeserializeOwned> PersistedValue<T> {
    pub fn new(cache: KeyedCache, key: impl Into<String>) -> Self {
        Self {
            cache,
            key: key.into(),
            _marker: PhantomData,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current value, `None` if absent, stale or unreadable.
    pub fn get(&self) -> Option<T> {
        self.cache.read(&self.key)
    }

    /// Replaces the value and refreshes its timestamp.
    pub fn set(&self, value: &T) -> bool {
        self.cache.write(&self.key, value)
    }

    /// Deletes the stored value.
    pub fn clear(&self) {
        self.cache.invalidate(&self.key)
    }

    pub fn exists(&self) -> bool {
        self.cache.has(&self.key)
    }
}

//! Store Module
//!
//! Durable string-keyed storage behind the cache. Any synchronous key-value
//! store that can enumerate its keys satisfies [`KeyValueStore`].

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::Result;

// == Key-Value Store Contract ==
/// Storage capability injected into the cache.
///
/// Implementations are shared process-wide; concurrent writers to the same
/// key resolve last-writer-wins.
pub trait KeyValueStore: Send + Sync {
    /// Returns the raw value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Absent keys are not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Removes every key in the store.
    fn clear(&self) -> Result<()>;

    /// Lists every key currently stored.
    fn keys(&self) -> Result<Vec<String>>;
}

//! Cache Module
//!
//! TTL-bounded caching over an injectable key-value store, in three shapes:
//! the raw [`KeyedCache`], the typed single-key [`PersistedValue`], and the
//! fetcher-backed [`ReadThroughCache`] with cooperative cancellation.

mod clock;
mod entry;
mod keyed;
mod persisted;
mod read_through;
mod stats;


// Re-export public types
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use keyed::{KeyedCache, Resolved, Source};
pub use persisted::PersistedValue;
pub use read_through::{FetchState, Fetcher, ReadThroughCache, DEFAULT_FETCH_TIMEOUT};
pub use stats::CacheStats;

//! Read-Through Cache Module
//!
//! Fetcher-backed cache for one key, exposing a `(data, loading, error)`
//! triple. Starting a fetch cancels the one in flight for the same key: only
//! the most recently initiated fetch may write its result.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cache::KeyedCache;
use crate::error::{CacheError, Result};

/// Default upper bound for a single fetcher call.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

// == Fetcher ==
/// Asynchronous producer of a cached value.
///
/// The token is cancelled when a newer fetch for the same key starts;
/// fetchers may watch it to stop early, and whatever they return after that
/// point is discarded.
#[async_trait]
pub trait Fetcher<T: Send + 'static>: Send + Sync {
    async fn fetch(&self, cancel: CancellationToken) -> anyhow::Result<T>;
}

#[async_trait]
impl<T, F, Fut> Fetcher<T> for F
where
    T: Send + 'static,
    F: Fn(CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<T>> + Send,
{
    async fn fetch(&self, cancel: CancellationToken) -> anyhow::Result<T> {
        (self)(cancel).await
    }
}

// == Fetch State ==
/// What presentation code renders for one cached resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

struct Inflight<T> {
    generation: u64,
    token: CancellationToken,
    state: FetchState<T>,
}

// == Read-Through Cache ==
pub struct ReadThroughCache<T: Send + 'static> {
    key: String,
    cache: KeyedCache,
    fetcher: Arc<dyn Fetcher<T>>,
    fallback: Option<T>,
    timeout: Duration,
    inner: Mutex<Inflight<T>>,
}

impl<T: Send + 'static> fmt::Debug for ReadThroughCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadThroughCache")
            .field("key", &self.key)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl<T> ReadThroughCache<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    // == Constructor ==
    pub fn new(cache: KeyedCache, key: impl Into<String>, fetcher: impl Fetcher<T> + 'static) -> Self {
        Self {
            key: key.into(),
            cache,
            fetcher: Arc::new(fetcher),
            fallback: None,
            timeout: DEFAULT_FETCH_TIMEOUT,
            inner: Mutex::new(Inflight {
                generation: 0,
                token: CancellationToken::new(),
                state: FetchState::default(),
            }),
        }
    }

    /// Builds the cache from an async closure taking the cancellation token.
    pub fn from_fn<F, Fut>(cache: KeyedCache, key: impl Into<String>, fetcher: F) -> Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send,
    {
        Self::new(cache, key, fetcher)
    }

    /// Value substituted (and cached) when the fetcher fails.
    pub fn with_fallback(mut self, fallback: T) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Snapshot of the `(data, loading, error)` triple.
    pub async fn state(&self) -> FetchState<T> {
        self.inner.lock().await.state.clone()
    }

    // == Load ==
    /// Serves a fresh cache entry, or fetches on miss.
    pub async fn load(&self) -> Result<T> {
        if let Some(value) = self.cache.read::<T>(&self.key) {
            let mut inner = self.inner.lock().await;
            inner.state.data = Some(value.clone());
            inner.state.error = None;
            return Ok(value);
        }
        self.refetch().await
    }

    /// Cancels the fetch in flight, if any, and returns the new generation.
    fn supersede(inner: &mut Inflight<T>) -> (u64, CancellationToken) {
        inner.token.cancel();
        inner.generation += 1;
        inner.token = CancellationToken::new();
        (inner.generation, inner.token.clone())
    }

    // == Refetch ==
    /// Fetches unconditionally, superseding any fetch in flight.
    ///
    /// A superseded call returns `Err(Cancelled)` and leaves the shared
    /// state and the store untouched.
    pub async fn refetch(&self) -> Result<T> {
        let (generation, token) = {
            let mut inner = self.inner.lock().await;
            let next = Self::supersede(&mut inner);
            inner.state.loading = true;
            inner.state.error = None;
            next
        };

        let outcome = tokio::select! {
            _ = token.cancelled() => None,
            result = tokio::time::timeout(self.timeout, self.fetcher.fetch(token.clone())) => Some(result),
        };

        let mut inner = self.inner.lock().await;
        let outcome = match outcome {
            Some(outcome) if inner.generation == generation && !token.is_cancelled() => outcome,
            _ => {
                debug!("Discarding superseded fetch #{} for '{}'", generation, self.key);
                return Err(CacheError::Cancelled(self.key.clone()));
            }
        };
        inner.state.loading = false;

        let failure = match outcome {
            Ok(Ok(value)) => {
                self.cache.write(&self.key, &value);
                inner.state.data = Some(value.clone());
                return Ok(value);
            }
            Ok(Err(e)) => CacheError::Fetch(format!("{:#}", e)),
            Err(_) => CacheError::Timeout(self.key.clone()),
        };

        match &self.fallback {
            Some(fallback) => {
                warn!("Fetch for '{}' failed, using fallback: {}", self.key, failure);
                self.cache.write(&self.key, fallback);
                inner.state.data = Some(fallback.clone());
                Ok(fallback.clone())
            }
            None => {
                inner.state.error = Some(failure.to_string());
                Err(failure)
            }
        }
    }

    // == Set ==
    /// Stores `value` directly, superseding any fetch in flight.
    pub async fn set(&self, value: T) {
        let mut inner = self.inner.lock().await;
        Self::supersede(&mut inner);
        self.cache.write(&self.key, &value);
        inner.state = FetchState {
            data: Some(value),
            loading: false,
            error: None,
        };
    }

    // == Invalidate ==
    /// Drops the cached entry and supersedes any fetch in flight; the
    /// in-memory triple keeps its last data.
    pub async fn invalidate(&self) {
        let mut inner = self.inner.lock().await;
        Self::supersede(&mut inner);
        inner.state.loading = false;
        self.cache.invalidate(&self.key);
    }
}

//! API Handlers
//!
//! HTTP request handlers for the cache, filter-scope and palette endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, RawQuery, State},
    Json,
};
use serde_json::Value;

use crate::cache::{Fetcher, KeyedCache, ReadThroughCache, DEFAULT_FETCH_TIMEOUT};
use crate::error::{CacheError, Result};
use crate::filters::{schema_for, scope_key, FilterSync, FilterUpdate, MemoryRouter, QueryRouter};
use crate::models::{
    validate_key, ClearQuery, ClearResponse, EntryResponse, FilterStateResponse, HealthResponse,
    KeyResponse, StatsResponse, WriteRequest,
};
use crate::store::{FileStore, KeyValueStore, MemoryStore};
use crate::theme::{generate_palette, Palette};

/// Application state shared across all handlers.
///
/// `KeyedCache` is internally synchronized and cheap to clone.
#[derive(Clone, Debug)]
pub struct AppState {
    pub cache: KeyedCache,
    /// Timeout applied to read-through fetchers built from this state
    pub fetch_timeout: Duration,
}

impl AppState {
    /// Creates a new AppState with the given cache.
    pub fn new(cache: KeyedCache) -> Self {
        Self {
            cache,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Uses a file-backed store when `store_path` is set, otherwise an
    /// in-memory store limited to `store_quota_bytes`.
    pub fn from_config(config: &crate::config::Config) -> Self {
        let store: Arc<dyn KeyValueStore> = match &config.store_path {
            Some(path) => Arc::new(FileStore::open(path)),
            None => Arc::new(MemoryStore::with_quota(config.store_quota_bytes)),
        };
        Self {
            cache: KeyedCache::new(store, Duration::from_secs(config.cache_ttl)),
            fetch_timeout: Duration::from_secs(config.fetch_timeout),
        }
    }

    /// Builds a read-through cache for `key` on the shared cache, bounded by
    /// the configured fetch timeout.
    pub fn read_through<T>(
        &self,
        key: &str,
        fetcher: impl Fetcher<T> + 'static,
    ) -> ReadThroughCache<T>
    where
        T: Clone + serde::Serialize + serde::de::DeserializeOwned + Send + Sync + 'static,
    {
        ReadThroughCache::new(self.cache.clone(), key, fetcher).with_timeout(self.fetch_timeout)
    }
}

fn check_key(key: &str) -> Result<()> {
    match validate_key(key) {
        Some(msg) => Err(CacheError::InvalidRequest(msg)),
        None => Ok(()),
    }
}

/// Handler for GET /cache/:key
pub async fn read_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<EntryResponse>> {
    check_key(&key)?;
    let data = state
        .cache
        .read::<Value>(&key)
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(EntryResponse::new(key, data)))
}

/// Handler for PUT /cache/:key
pub async fn write_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<WriteRequest>,
) -> Result<Json<KeyResponse>> {
    check_key(&key)?;
    if !state.cache.write(&key, &req.data) {
        return Err(CacheError::Storage(format!("Key '{}' was not persisted", key)));
    }

    Ok(Json(KeyResponse::written(key)))
}

/// Handler for DELETE /cache/:key
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<KeyResponse>> {
    check_key(&key)?;
    state.cache.invalidate(&key);

    Ok(Json(KeyResponse::invalidated(key)))
}

/// Handler for DELETE /cache?prefix=...
///
/// Without `prefix` the whole store is wiped.
pub async fn clear_handler(
    State(state): State<AppState>,
    Query(query): Query<ClearQuery>,
) -> Json<ClearResponse> {
    match query.prefix.filter(|p| !p.is_empty()) {
        Some(prefix) => {
            let removed = state.cache.clear_by_prefix(&prefix);
            Json(ClearResponse::prefix(&prefix, removed))
        }
        None => {
            state.cache.clear_all();
            Json(ClearResponse::all())
        }
    }
}

/// Mounts a built-in filter scope against the request's query string.
fn mount_scope(
    state: &AppState,
    scope: &str,
    query: Option<String>,
) -> Result<(FilterSync, Arc<MemoryRouter>)> {
    let schema = schema_for(scope)
        .ok_or_else(|| CacheError::NotFound(format!("filter scope '{}'", scope)))?;
    let router = Arc::new(MemoryRouter::from_query(query.as_deref().unwrap_or_default()));
    let sync = FilterSync::mount(schema, state.cache.clone(), scope_key(scope), router.clone());
    Ok((sync, router))
}

fn filter_state(
    scope: String,
    sync: &FilterSync,
    router: &MemoryRouter,
) -> Json<FilterStateResponse> {
    Json(FilterStateResponse {
        scope,
        filters: sync.filters().clone(),
        query: router.query().to_string(),
    })
}

/// Handler for GET /filters/:scope
///
/// Resolves the scope's filters from the query string, cached filters and
/// defaults.
pub async fn filters_handler(
    State(state): State<AppState>,
    Path(scope): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Json<FilterStateResponse>> {
    let (sync, router) = mount_scope(&state, &scope, query)?;
    Ok(filter_state(scope, &sync, &router))
}

/// Handler for PATCH /filters/:scope
pub async fn update_filters_handler(
    State(state): State<AppState>,
    Path(scope): Path<String>,
    RawQuery(query): RawQuery,
    Json(update): Json<FilterUpdate>,
) -> Result<Json<FilterStateResponse>> {
    let (mut sync, router) = mount_scope(&state, &scope, query)?;
    sync.update(update);
    Ok(filter_state(scope, &sync, &router))
}

/// Handler for POST /filters/:scope/reset
pub async fn reset_filters_handler(
    State(state): State<AppState>,
    Path(scope): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Json<FilterStateResponse>> {
    let (mut sync, router) = mount_scope(&state, &scope, query)?;
    sync.reset();
    Ok(filter_state(scope, &sync, &router))
}

/// Handler for DELETE /filters/:scope
pub async fn clear_filters_handler(
    State(state): State<AppState>,
    Path(scope): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Json<FilterStateResponse>> {
    let (mut sync, router) = mount_scope(&state, &scope, query)?;
    sync.clear();
    Ok(filter_state(scope, &sync, &router))
}

/// Handler for GET /palette/:seed
///
/// The seed is a hex color without the leading `#`.
pub async fn palette_handler(Path(seed): Path<String>) -> Result<Json<Palette>> {
    Ok(Json(generate_palette(&seed)?))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.cache.stats()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

//! Filter Sync Module
//!
//! Keeps one scope's [`FilterSet`] consistent across the URL query, the
//! cache and memory. The URL wins on mount and on every external navigation;
//! updates flow from memory to the cache and then to the URL.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use super::{FilterDef, FilterSchema, FilterSet, FilterUpdate, FilterValue, QueryParams, QueryRouter};
use crate::cache::{KeyedCache, PersistedValue};

// == Filter Sync ==
/// Synchronizer for one filter scope. Constructed ready by [`FilterSync::mount`].
pub struct FilterSync {
    schema: FilterSchema,
    persisted: PersistedValue<FilterSet>,
    router: Arc<dyn QueryRouter>,
    changes: watch::Receiver<QueryParams>,
    filters: FilterSet,
}

impl fmt::Debug for FilterSync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterSync")
            .field("scope", &self.persisted.key())
            .field("filters", &self.filters)
            .finish_non_exhaustive()
    }
}

/// Parses a query value for `def`; malformed values count as absent.
fn parse_param(def: &FilterDef, raw: &str) -> Option<FilterValue> {
    let value = def.kind.parse(raw);
    if value.is_none() && !raw.is_empty() {
        warn!(
            "Ignoring malformed value '{}' for filter '{}' ({:?})",
            raw, def.name, def.kind
        );
    }
    value
}

/// Zero of the companion filter in its declared kind.
fn companion_zero(def: &FilterDef) -> Option<FilterValue> {
    def.kind.coerce(FilterValue::Int(0))
}

impl FilterSync {
    // == Mount ==
    /// Derives the initial filter set, per declared filter:
    /// URL value, else cached value, else the declared default.
    pub fn mount(
        schema: FilterSchema,
        cache: KeyedCache,
        scope_key: impl Into<String>,
        router: Arc<dyn QueryRouter>,
    ) -> Self {
        let persisted = PersistedValue::<FilterSet>::new(cache, scope_key);
        let mut changes = router.subscribe();
        let query = changes.borrow_and_update().clone();
        let cached = persisted.get();

        let mut filters = FilterSet::default();
        for def in schema.defs() {
            let from_url = query.get(&def.param).and_then(|raw| parse_param(def, raw));
            let from_cache = cached
                .as_ref()
                .and_then(|c| c.get(&def.name))
                .and_then(|v| def.kind.coerce(v.clone()));
            filters.insert(
                def.name.clone(),
                from_url.or(from_cache).or_else(|| def.default.clone()),
            );
        }
        debug!("Mounted filter scope '{}': {:?}", persisted.key(), filters);

        Self {
            schema,
            persisted,
            router,
            changes,
            filters,
        }
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn schema(&self) -> &FilterSchema {
        &self.schema
    }

    pub fn scope_key(&self) -> &str {
        self.persisted.key()
    }

    // == Update ==
    /// Merges `update`, persists the result and rewrites the URL.
    ///
    /// Unknown filters and values that cannot be coerced to the declared
    /// kind are ignored. Unless the update applies a value to the companion
    /// filter itself, the companion is reset to zero.
    pub fn update(&mut self, update: FilterUpdate) -> &FilterSet {
        let mut touched = Vec::new();

        for (name, value) in update.iter() {
            let Some(def) = self.schema.get(name) else {
                warn!("Ignoring unknown filter '{}' in scope '{}'", name, self.scope_key());
                continue;
            };
            let value = match value {
                Some(value) => match def.kind.coerce(value.clone()) {
                    Some(value) => Some(value),
                    None if value.as_text().is_some_and(str::is_empty) => None,
                    None => {
                        warn!("Ignoring value '{}' for {:?} filter '{}'", value, def.kind, name);
                        continue;
                    }
                },
                None => None,
            };
            self.filters.insert(name, value);
            touched.push(def.name.clone());
        }

        if touched.is_empty() {
            return &self.filters;
        }

        if let Some(companion) = self.schema.companion_def() {
            if !touched.contains(&companion.name) {
                self.filters.insert(companion.name.clone(), companion_zero(companion));
                touched.push(companion.name.clone());
            }
        }

        self.persisted.set(&self.filters);
        self.write_url(&touched);
        &self.filters
    }

    // == Reset ==
    /// Restores the defaults in memory, in the cache and in the URL.
    pub fn reset(&mut self) -> &FilterSet {
        self.filters = self.schema.defaults();
        self.persisted.set(&self.filters);
        self.write_all_to_url();
        &self.filters
    }

    // == Clear ==
    /// Like [`reset`](Self::reset), but deletes the cache entry instead of
    /// storing the defaults.
    pub fn clear(&mut self) -> &FilterSet {
        self.filters = self.schema.defaults();
        self.persisted.clear();
        self.write_all_to_url();
        &self.filters
    }

    // == External URL Changes ==
    /// Pulls filters from the current URL. Every declared filter whose URL
    /// value differs from memory takes the URL value; the merged set is
    /// persisted if anything changed.
    ///
    /// Returns whether any filter changed.
    pub fn sync_from_url(&mut self) -> bool {
        let query = self.changes.borrow_and_update().clone();
        self.apply_url(&query)
    }

    /// Waits for a URL change that alters the filters and applies it.
    ///
    /// Returns `None` once the router is gone.
    pub async fn next_external_change(&mut self) -> Option<&FilterSet> {
        loop {
            self.changes.changed().await.ok()?;
            if self.sync_from_url() {
                return Some(&self.filters);
            }
        }
    }

    // == URL Serialization ==
    /// Query value for a filter, `None` when the parameter is omitted:
    /// unset, empty text, or the companion at zero.
    fn url_value(&self, def: &FilterDef) -> Option<String> {
        let value = self.filters.get(&def.name)?;
        let companion = self.schema.companion_def().filter(|c| c.name == def.name);
        match value {
            FilterValue::Text(s) if s.is_empty() => None,
            value if companion.is_some_and(|c| companion_zero(c).as_ref() == Some(value)) => None,
            value => Some(value.to_string()),
        }
    }

    fn write_all_to_url(&mut self) {
        let all: Vec<String> = self.schema.defs().iter().map(|d| d.name.clone()).collect();
        self.write_url(&all);
    }

    /// Rewrites the URL with a replace. Filter parameters come first in
    /// declaration order, covering the touched filters and those already in
    /// the URL; other parameters follow untouched.
    fn write_url(&mut self, touched: &[String]) {
        let current = self.router.query();
        let mut next = QueryParams::new();

        for def in self.schema.defs() {
            if !touched.contains(&def.name) && !current.contains(&def.param) {
                continue;
            }
            if let Some(value) = self.url_value(def) {
                next.push(def.param.clone(), value);
            }
        }
        for (name, value) in current.iter() {
            if !self.schema.is_param(name) {
                next.push(name, value);
            }
        }

        self.router.replace(next.clone());

        // Our own replace is not an external change; anything else that
        // slipped in meanwhile still is.
        let seen = self.changes.borrow_and_update().clone();
        if seen != next {
            self.apply_url(&seen);
        }
    }

    fn apply_url(&mut self, query: &QueryParams) -> bool {
        let mut changed = false;
        for def in self.schema.defs() {
            let Some(value) = query.get(&def.param).and_then(|raw| parse_param(def, raw)) else {
                continue;
            };
            if self.filters.get(&def.name) != Some(&value) {
                self.filters.insert(def.name.clone(), Some(value));
                changed = true;
            }
        }

        if changed {
            debug!("Filter scope '{}' synced from URL: {:?}", self.scope_key(), self.filters);
            self.persisted.set(&self.filters);
        }
        changed
    }
}

//! Filter Schema Module
//!
//! Declared filters of a scope, the live [`FilterSet`] and partial
//! [`FilterUpdate`]s applied to it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{FilterKind, FilterValue};

// == Filter Definition ==
/// One declared filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterDef {
    /// Filter name used in memory and in the cache
    pub name: String,
    /// Query-string parameter name, identical to `name` unless remapped
    pub param: String,
    pub kind: FilterKind,
    pub default: Option<FilterValue>,
}

// == Filter Schema ==
/// Ordered filter declarations for one scope.
///
/// Declaration order is the order parameters appear in the URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSchema {
    defs: Vec<FilterDef>,
    companion: Option<String>,
}

impl FilterSchema {
    pub fn new() -> Self {
        Self::default()
    }

    fn declare(mut self, name: &str, kind: FilterKind, default: Option<FilterValue>) -> Self {
        let def = FilterDef {
            name: name.to_string(),
            param: name.to_string(),
            kind,
            default,
        };
        match self.defs.iter_mut().find(|d| d.name == name) {
            Some(existing) => *existing = def,
            None => self.defs.push(def),
        }
        self
    }

    /// Declares an integer filter.
    pub fn int(self, name: &str, default: Option<i64>) -> Self {
        self.declare(name, FilterKind::Int, default.map(FilterValue::Int))
    }

    /// Declares a text filter.
    pub fn text(self, name: &str, default: Option<&str>) -> Self {
        self.declare(name, FilterKind::Text, default.map(FilterValue::from))
    }

    /// Maps filter `name` to a different query parameter.
    pub fn param(mut self, name: &str, param: &str) -> Self {
        if let Some(def) = self.defs.iter_mut().find(|d| d.name == name) {
            def.param = param.to_string();
        }
        self
    }

    /// Marks `name` as the pagination offset: any update that does not set
    /// it explicitly resets it to zero.
    pub fn companion(mut self, name: &str) -> Self {
        self.companion = Some(name.to_string());
        self
    }

    pub fn defs(&self) -> &[FilterDef] {
        &self.defs
    }

    pub fn get(&self, name: &str) -> Option<&FilterDef> {
        self.defs.iter().find(|d| d.name == name)
    }

    /// Whether `param` is the query parameter of a declared filter.
    pub fn is_param(&self, param: &str) -> bool {
        self.defs.iter().any(|d| d.param == param)
    }

    pub fn companion_def(&self) -> Option<&FilterDef> {
        self.companion.as_deref().and_then(|name| self.get(name))
    }

    /// The complete default filter set.
    pub fn defaults(&self) -> FilterSet {
        FilterSet(
            self.defs
                .iter()
                .map(|d| (d.name.clone(), d.default.clone()))
                .collect(),
        )
    }
}

// == Filter Set ==
/// Filter name to value, unset filters held as `None`.
///
/// Serialized as a JSON object with `null` for unset filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSet(BTreeMap<String, Option<FilterValue>>);

impl FilterSet {
    pub fn get(&self, name: &str) -> Option<&FilterValue> {
        self.0.get(name).and_then(Option::as_ref)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(FilterValue::as_int)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FilterValue::as_text)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Option<FilterValue>) {
        self.0.insert(name.into(), value);
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&FilterValue>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// == Filter Update ==
/// Partial change to a filter set. `None` clears the filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct FilterUpdate(BTreeMap<String, Option<FilterValue>>);

impl FilterUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, name: &str, value: impl Into<FilterValue>) -> Self {
        self.0.insert(name.to_string(), Some(value.into()));
        self
    }

    pub fn unset(mut self, name: &str) -> Self {
        self.0.insert(name.to_string(), None);
        self
    }

    /// Whether the update mentions `name`, set or unset.
    pub fn touches(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&FilterValue>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

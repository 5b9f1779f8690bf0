//! Filter scalar values and their declared kinds.

use std::fmt;

use serde::{Deserialize, Serialize};

// == Filter Value ==
/// A single filter scalar. Unset is represented by `Option::None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Int(i64),
    Text(String),
}

impl FilterValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            FilterValue::Int(n) => Some(*n),
            FilterValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FilterValue::Text(s) => Some(s),
            FilterValue::Int(_) => None,
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Int(n) => write!(f, "{}", n),
            FilterValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        FilterValue::Int(n)
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::Text(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        FilterValue::Text(s)
    }
}

// == Filter Kind ==
/// Declared type of a filter, driving URL coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Int,
    Text,
}

impl FilterKind {
    /// Parses a raw query-string value.
    ///
    /// Integers use strict base-10 parsing; anything else yields `None`.
    /// An empty string is always unset.
    pub fn parse(self, raw: &str) -> Option<FilterValue> {
        if raw.is_empty() {
            return None;
        }
        match self {
            FilterKind::Int => raw.trim().parse::<i64>().ok().map(FilterValue::Int),
            FilterKind::Text => Some(FilterValue::Text(raw.to_string())),
        }
    }

    /// Brings a value of either kind into this kind.
    ///
    /// Text holding an integer converts to `Int`; integers convert to their
    /// decimal text. Empty text becomes unset (`None`), as does text that is
    /// not a valid integer for an `Int` filter.
    pub fn coerce(self, value: FilterValue) -> Option<FilterValue> {
        match (self, value) {
            (_, FilterValue::Text(s)) if s.is_empty() => None,
            (FilterKind::Int, FilterValue::Int(n)) => Some(FilterValue::Int(n)),
            (FilterKind::Int, FilterValue::Text(s)) => self.parse(&s),
            (FilterKind::Text, FilterValue::Int(n)) => Some(FilterValue::Text(n.to_string())),
            (FilterKind::Text, value @ FilterValue::Text(_)) => Some(value),
        }
    }
}

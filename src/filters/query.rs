//! Query Module
//!
//! Query-string parameters and the router capability the synchronizer uses
//! to read, replace and watch them.

use std::fmt;
use std::sync::Mutex;

use tokio::sync::watch;
use url::form_urlencoded;

// == Query Params ==
/// Ordered query-string pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a query string, with or without the leading `?`.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self(form_urlencoded::parse(query.as_bytes()).into_owned().collect())
    }

    /// First value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|(k, _)| k == name)
    }

    /// Appends a pair.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// Sets `name` in place of its first occurrence, dropping duplicates.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.0.iter().position(|(k, _)| k == name) {
            Some(index) => {
                self.0[index].1 = value;
                let mut seen = 0;
                self.0.retain(|(k, _)| {
                    if k != name {
                        return true;
                    }
                    seen += 1;
                    seen == 1
                });
            }
            None => self.push(name, value),
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.0.retain(|(k, _)| k != name);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for QueryParams {
    /// Encodes as `a=1&b=2`, without the leading `?`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.0.iter())
            .finish();
        f.write_str(&encoded)
    }
}

// == Query Router ==
/// Owner of the current query string.
pub trait QueryRouter: Send + Sync {
    /// Current query parameters.
    fn query(&self) -> QueryParams;

    /// Replaces the current query without adding a history entry.
    fn replace(&self, query: QueryParams);

    /// Receiver notified on every query change, replaces included.
    fn subscribe(&self) -> watch::Receiver<QueryParams>;
}

// == Memory Router ==
/// In-process router with back/forward history.
#[derive(Debug)]
pub struct MemoryRouter {
    current: watch::Sender<QueryParams>,
    history: Mutex<History>,
}

#[derive(Debug)]
struct History {
    entries: Vec<QueryParams>,
    index: usize,
}

impl MemoryRouter {
    pub fn new(initial: QueryParams) -> Self {
        let (current, _) = watch::channel(initial.clone());
        Self {
            current,
            history: Mutex::new(History {
                entries: vec![initial],
                index: 0,
            }),
        }
    }

    /// Starts at the given query string.
    pub fn from_query(query: &str) -> Self {
        Self::new(QueryParams::parse(query))
    }

    fn with_history<R>(&self, f: impl FnOnce(&mut History) -> R) -> R {
        let mut history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut history)
    }

    /// Navigates to `query`, pushing a history entry.
    pub fn navigate(&self, query: QueryParams) {
        self.with_history(|h| {
            h.entries.truncate(h.index + 1);
            h.entries.push(query.clone());
            h.index = h.entries.len() - 1;
        });
        self.current.send_replace(query);
    }

    /// Steps back one history entry. Returns false at the start of history.
    pub fn back(&self) -> bool {
        self.step(-1)
    }

    /// Steps forward one history entry. Returns false at the end of history.
    pub fn forward(&self) -> bool {
        self.step(1)
    }

    fn step(&self, delta: isize) -> bool {
        let target = self.with_history(|h| {
            let index = h.index.checked_add_signed(delta)?;
            let query = h.entries.get(index)?.clone();
            h.index = index;
            Some(query)
        });
        match target {
            Some(query) => {
                self.current.send_replace(query);
                true
            }
            None => false,
        }
    }

    pub fn history_len(&self) -> usize {
        self.with_history(|h| h.entries.len())
    }
}

impl Default for MemoryRouter {
    fn default() -> Self {
        Self::new(QueryParams::new())
    }
}

impl QueryRouter for MemoryRouter {
    fn query(&self) -> QueryParams {
        self.current.borrow().clone()
    }

    fn replace(&self, query: QueryParams) {
        self.with_history(|h| h.entries[h.index] = query.clone());
        self.current.send_replace(query);
    }

    fn subscribe(&self) -> watch::Receiver<QueryParams> {
        self.current.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_encode() {
        let query = QueryParams::parse("?chainId=137&token=usd%20coin&limit=20");

        assert_eq!(query.get("chainId"), Some("137"));
        assert_eq!(query.get("token"), Some("usd coin"));
        assert_eq!(query.to_string(), "chainId=137&token=usd+coin&limit=20");
    }

    #[test]
    fn test_set_replaces_first_and_drops_duplicates() {
        let mut query = QueryParams::parse("a=1&b=2&a=3");
        query.set("a", "9");
        assert_eq!(query.to_string(), "a=9&b=2");

        query.set("c", "4");
        query.remove("b");
        assert_eq!(query.to_string(), "a=9&c=4");
    }

    #[test]
    fn test_replace_does_not_grow_history() {
        let router = MemoryRouter::from_query("limit=20");
        router.replace(QueryParams::parse("limit=30"));

        assert_eq!(router.history_len(), 1);
        assert_eq!(router.query().get("limit"), Some("30"));
    }

    #[test]
    fn test_back_and_forward() {
        let router = MemoryRouter::from_query("page=1");
        router.navigate(QueryParams::parse("page=2"));
        router.navigate(QueryParams::parse("page=3"));

        assert!(router.back());
        assert_eq!(router.query().get("page"), Some("2"));
        assert!(router.back());
        assert!(!router.back());
        assert_eq!(router.query().get("page"), Some("1"));

        assert!(router.forward());
        assert_eq!(router.query().get("page"), Some("2"));

        // Navigating drops the forward entries
        router.navigate(QueryParams::parse("page=9"));
        assert!(!router.forward());
        assert_eq!(router.history_len(), 3);
    }

    #[tokio::test]
    async fn test_subscribers_see_navigation() {
        let router = MemoryRouter::default();
        let mut rx = router.subscribe();

        router.navigate(QueryParams::parse("chainId=56"));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().get("chainId"), Some("56"));
    }
}

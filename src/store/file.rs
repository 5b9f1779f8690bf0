//! File-backed key-value store.
//!
//! The whole store is one JSON object on disk. It is loaded once on open and
//! rewritten on every mutation through a temp file + rename, so a crash never
//! leaves a half-written store behind.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{debug, warn};

use super::KeyValueStore;
use crate::error::{CacheError, Result};

// == File Store ==
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    /// Opens the store at `path`, creating it lazily on first write.
    ///
    /// A missing file yields an empty store. An unreadable or corrupt file is
    /// logged and also yields an empty store; it is overwritten on next write.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
                Ok(entries) => {
                    debug!("Loaded {} entries from {}", entries.len(), path.display());
                    entries
                }
                Err(e) => {
                    warn!("Discarding corrupt store file {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!("Cannot read store file {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };

        Self {
            path,
            entries: RwLock::new(entries),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let raw = serde_json::to_string(entries)?;
        let tmp = self.path.with_extension("tmp");

        fs::write(&tmp, raw)
            .and_then(|_| fs::rename(&tmp, &self.path))
            .map_err(|e| CacheError::Storage(format!("{}: {}", self.path.display(), e)))
    }

    /// Applies `mutate` and persists; the in-memory map is rolled back if the
    /// flush fails so memory never runs ahead of disk.
    fn mutate<F>(&self, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        let mut next = entries.clone();
        mutate(&mut next);
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }
}

fn poisoned() -> CacheError {
    CacheError::Storage("file store lock poisoned".to_string())
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.mutate(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.mutate(|entries| {
            entries.remove(key);
        })
    }

    fn clear(&self) -> Result<()> {
        self.mutate(|entries| entries.clear())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        {
            let store = FileStore::open(&path);
            store.set("filters:pools", r#"{"data":{},"timestamp":1}"#).unwrap();
            store.set("chains", "[]").unwrap();
            store.remove("chains").unwrap();
        }

        let reopened = FileStore::open(&path);
        assert_eq!(reopened.path(), path.as_path());
        assert_eq!(
            reopened.get("filters:pools").unwrap().as_deref(),
            Some(r#"{"data":{},"timestamp":1}"#)
        );
        assert!(reopened.get("chains").unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{not json").unwrap();

        let store = FileStore::open(&path);
        assert!(store.keys().unwrap().is_empty());

        store.set("a", "1").unwrap();
        assert_eq!(FileStore::open(&path).get("a").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_failed_flush_keeps_memory_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        // Parent directory does not exist, so every flush fails
        let store = FileStore::open(dir.path().join("missing").join("store.json"));

        assert!(matches!(store.set("a", "1"), Err(CacheError::Storage(_))));
        assert!(store.get("a").unwrap().is_none());
    }
}

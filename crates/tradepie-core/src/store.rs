//! Persisted last-seen snapshot.
//!
//! [`KeyValueStore`] is the storage capability (a flat string key/value space,
//! like browser local storage). [`SnapshotCache`] layers the snapshot contract
//! on top: one fixed key, JSON array payload, failures downgraded to "no data".

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::{CoreError, Snapshot};

/// Key under which the last snapshot is stored.
pub const DEFAULT_STORAGE_KEY: &str = "trading";

const ENTRY_PREFIX: &str = "tradepie-";
const ENTRY_EXTENSION: &str = "json";
const STAGING_EXTENSION: &str = "json.tmp";

/// Flat string key/value storage capability.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), CoreError>;
    fn remove(&self, key: &str) -> Result<(), CoreError>;
    /// Remove every key owned by this store.
    fn clear(&self) -> Result<(), CoreError>;
}

/// Process-local store; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .expect("memory store lock is not poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        let entries = self
            .entries
            .lock()
            .expect("memory store lock is not poisoned");
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        let mut entries = self
            .entries
            .lock()
            .expect("memory store lock is not poisoned");
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        let mut entries = self
            .entries
            .lock()
            .expect("memory store lock is not poisoned");
        entries.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), CoreError> {
        let mut entries = self
            .entries
            .lock()
            .expect("memory store lock is not poisoned");
        entries.clear();
        Ok(())
    }
}

/// Directory-backed store: one `tradepie-<key>.json` file per key.
///
/// The directory may be shared with other programs; only prefixed entries
/// belong to the store.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        let file_stem: String = key
            .chars()
            .map(|ch| {
                if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                    ch
                } else {
                    '_'
                }
            })
            .collect();
        self.root
            .join(format!("{ENTRY_PREFIX}{file_stem}.{ENTRY_EXTENSION}"))
    }

    fn owns(path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_prefix(ENTRY_PREFIX))
            .is_some_and(|rest| {
                rest.ends_with(&format!(".{ENTRY_EXTENSION}"))
                    || rest.ends_with(&format!(".{STAGING_EXTENSION}"))
            })
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        fs::create_dir_all(&self.root)?;
        let path = self.path_for(key);
        let staging = path.with_extension(STAGING_EXTENSION);
        fs::write(&staging, value)?;
        fs::rename(&staging, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }

    fn clear(&self) -> Result<(), CoreError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(()),
            Err(error) => return Err(error.into()),
        };

        for entry in entries {
            let path = entry?.path();
            if path.is_file() && Self::owns(&path) {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}

/// Last-seen snapshot persisted under a fixed key.
///
/// None of these operations fail. Store errors and unreadable payloads are
/// logged and treated as "no cached data".
#[derive(Clone)]
pub struct SnapshotCache {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl SnapshotCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(store, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Cache that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn load_cached_snapshot(&self) -> Option<Snapshot> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(error) => {
                tracing::warn!(key = %self.key, %error, "failed to read cached snapshot");
                return None;
            }
        };

        match serde_json::from_str::<Option<Snapshot>>(&raw) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                tracing::warn!(key = %self.key, %error, "ignoring malformed cached snapshot");
                None
            }
        }
    }

    pub fn save_snapshot(&self, snapshot: &Snapshot) {
        let payload = match serde_json::to_string(snapshot) {
            Ok(payload) => payload,
            Err(error) => {
                tracing::warn!(key = %self.key, %error, "failed to encode snapshot");
                return;
            }
        };

        if let Err(error) = self.store.set(&self.key, &payload) {
            tracing::warn!(key = %self.key, %error, "failed to persist snapshot");
        }
    }

    pub fn clear_snapshot(&self) {
        if let Err(error) = self.store.remove(&self.key) {
            tracing::warn!(key = %self.key, %error, "failed to clear cached snapshot");
        }
    }

    pub fn clear_all(&self) {
        if let Err(error) = self.store.clear() {
            tracing::warn!(%error, "failed to clear persisted state");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Symbol, TradeRecord};

    fn sample_snapshot() -> Snapshot {
        Snapshot::new(vec![
            TradeRecord::new(Symbol::parse("AAA").expect("symbol"), 10.0, "USD", 1.0)
                .expect("record"),
            TradeRecord::new(Symbol::parse("BBB").expect("symbol"), 5.25, "EUR", -2.5)
                .expect("record"),
        ])
    }

    #[test]
    fn memory_round_trip_preserves_snapshot() {
        let cache = SnapshotCache::in_memory();
        assert!(cache.load_cached_snapshot().is_none());

        let snapshot = sample_snapshot();
        cache.save_snapshot(&snapshot);
        assert_eq!(cache.load_cached_snapshot(), Some(snapshot));
    }

    #[test]
    fn malformed_payload_reads_as_absent() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(DEFAULT_STORAGE_KEY, "{not json")
            .expect("memory set");
        let cache = SnapshotCache::new(store);

        assert!(cache.load_cached_snapshot().is_none());
    }

    #[test]
    fn json_null_reads_as_absent() {
        let store = Arc::new(MemoryStore::new());
        store.set(DEFAULT_STORAGE_KEY, "null").expect("memory set");
        let cache = SnapshotCache::new(store);

        assert!(cache.load_cached_snapshot().is_none());
    }

    #[test]
    fn clear_snapshot_only_removes_own_key() {
        let store = Arc::new(MemoryStore::new());
        store.set("theme", "dark").expect("memory set");
        let cache = SnapshotCache::new(store.clone());
        cache.save_snapshot(&sample_snapshot());

        cache.clear_snapshot();

        assert!(cache.load_cached_snapshot().is_none());
        assert_eq!(store.get("theme").expect("memory get").as_deref(), Some("dark"));
    }

    #[test]
    fn clear_all_removes_every_key() {
        let store = Arc::new(MemoryStore::new());
        store.set("theme", "dark").expect("memory set");
        let cache = SnapshotCache::new(store.clone());
        cache.save_snapshot(&sample_snapshot());

        cache.clear_all();

        assert!(store.is_empty());
    }

    #[test]
    fn file_store_sanitizes_key_into_file_name() {
        let store = FileStore::new("/tmp/tradepie-test");
        assert_eq!(
            store.path_for("../trading data"),
            PathBuf::from("/tmp/tradepie-test/tradepie-___trading_data.json")
        );
    }

    #[test]
    fn file_store_owns_only_prefixed_entries() {
        assert!(FileStore::owns(Path::new("/home/tradepie-trading.json")));
        assert!(FileStore::owns(Path::new("/home/tradepie-trading.json.tmp")));
        assert!(!FileStore::owns(Path::new("/home/package.json")));
        assert!(!FileStore::owns(Path::new("/home/tradepie-notes.txt")));
    }
}

//! Key-value storage backends.
//!
//! Everything devotions keeps is a string under a string key. The durable
//! backend is the SQLite [`Database`](crate::db::Database); this module defines
//! the trait all backends share, an in-process [`MemoryStore`], and the
//! session-scoped [`SessionFile`] that holds the unlock flag.

mod session;

pub use self::session::{default_session_dir, SessionFile};

use crate::errors::StorageError;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StorageError>;

/// A synchronous string-to-string map that outlives the process (or, for the
/// session backend, the current session).
pub trait KeyValueStore {
    /// Returns the value under `key`, if any.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> StoreResult<()>;

    /// Every key and value currently stored, sorted by key.
    fn entries(&self) -> StoreResult<Vec<(String, String)>>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        (**self).remove(key)
    }

    fn entries(&self) -> StoreResult<Vec<(String, String)>> {
        (**self).entries()
    }
}

/// In-process store. Contents die with the value.
#[derive(Debug, Default)]
pub struct MemoryStore {
    map: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the current contents.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        // A poisoned map is still a consistent map: every operation is a single call.
        self.map.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.lock().remove(key);
        Ok(())
    }

    fn entries(&self) -> StoreResult<Vec<(String, String)>> {
        Ok(self
            .lock()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_last_write_wins() {
        let store = MemoryStore::new();
        store.set("devotions-mood-2024-03-05", "mania").unwrap();
        store.set("devotions-mood-2024-03-05", "baseline").unwrap();

        assert_eq!(
            store.get("devotions-mood-2024-03-05").unwrap().as_deref(),
            Some("baseline")
        );
        assert_eq!(store.entries().unwrap().len(), 1);
    }

    #[test]
    fn test_memory_store_remove_missing_key_is_ok() {
        let store = MemoryStore::new();
        assert!(store.remove("nothing-here").is_ok());
        assert!(store.get("nothing-here").unwrap().is_none());
    }

    #[test]
    fn test_entries_are_sorted_by_key() {
        let store = MemoryStore::new();
        store.set("b", "2").unwrap();
        store.set("a", "1").unwrap();
        store.set("c", "3").unwrap();

        let keys: Vec<String> = store.entries().unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_reference_forwards_to_store() {
        let store = MemoryStore::new();
        let by_ref: &dyn KeyValueStore = &store;
        by_ref.set("k", "v").unwrap();
        assert_eq!(store.snapshot().get("k").map(String::as_str), Some("v"));
    }
}

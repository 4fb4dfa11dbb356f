//! In-memory storage backend.

use crate::backend::DocumentBackend;
use crate::error::StorageResult;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

/// An in-memory document backend.
///
/// This backend stores all documents in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral stores that don't need persistence
///
/// # Thread Safety
///
/// All operations take the internal lock for their whole critical section,
/// so every trait operation is atomic with respect to concurrent callers.
///
/// # Example
///
/// ```rust
/// use pulsestore_storage::{DocumentBackend, MemoryBackend};
///
/// let backend = MemoryBackend::new();
/// backend.put("status", "k1", b"doc").unwrap();
/// assert_eq!(backend.fetch("status", "k1").unwrap(), Some(b"doc".to_vec()));
/// ```
#[derive(Debug, Default)]
pub struct MemoryBackend {
    collections: RwLock<HashMap<String, BTreeMap<String, Vec<u8>>>>,
}

impl MemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of documents stored in `collection`.
    ///
    /// Useful for testing and debugging.
    #[must_use]
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    /// Returns `true` when `collection` holds no documents.
    #[must_use]
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    /// Removes all documents from all collections.
    pub fn clear(&self) {
        self.collections.write().clear();
    }
}

impl DocumentBackend for MemoryBackend {
    fn fetch(&self, collection: &str, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let collections = self.collections.read();
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(key))
            .cloned())
    }

    fn insert_if_absent(&self, collection: &str, key: &str, doc: &[u8]) -> StorageResult<bool> {
        let mut collections = self.collections.write();
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.contains_key(key) {
            return Ok(false);
        }
        docs.insert(key.to_string(), doc.to_vec());
        Ok(true)
    }

    fn compare_and_put(
        &self,
        collection: &str,
        key: &str,
        expected: &[u8],
        doc: &[u8],
    ) -> StorageResult<bool> {
        let mut collections = self.collections.write();
        let docs = collections.entry(collection.to_string()).or_default();
        match docs.get(key) {
            Some(current) if current.as_slice() == expected => {
                docs.insert(key.to_string(), doc.to_vec());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn put(&self, collection: &str, key: &str, doc: &[u8]) -> StorageResult<()> {
        let mut collections = self.collections.write();
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(key.to_string(), doc.to_vec());
        Ok(())
    }

    fn remove(&self, collection: &str, key: &str) -> StorageResult<bool> {
        let mut collections = self.collections.write();
        Ok(collections
            .get_mut(collection)
            .is_some_and(|docs| docs.remove(key).is_some()))
    }

    fn scan(&self, collection: &str) -> StorageResult<Vec<(String, Vec<u8>)>> {
        let collections = self.collections.read();
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }
}

//! Storage backend trait definition.

use crate::error::StorageResult;

/// A low-level document store for pulsestore.
///
/// Backends are **opaque byte stores** keyed by `(collection, key)`. They
/// provide key lookup, atomic upsert, and range scan. The core engine owns
/// all document encoding - backends do not understand records, lifecycle
/// states, or projections.
///
/// # Invariants
///
/// - `insert_if_absent` is atomic: of any number of concurrent calls for the
///   same key, exactly one observes `true`
/// - `compare_and_put` is atomic: the comparison against the current bytes
///   and the replacement happen as one step, so of any number of concurrent
///   calls over the same prior bytes, exactly one observes `true`
/// - `fetch` returns exactly the bytes most recently stored for that key
/// - `scan` returns entries in ascending key order
/// - Backends must be `Send + Sync` for concurrent access
///
/// # Implementors
///
/// - [`super::MemoryBackend`] - For testing and ephemeral stores
pub trait DocumentBackend: Send + Sync {
    /// Looks up the document stored under `key` in `collection`.
    ///
    /// Returns `None` when no document exists for the key.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails at the backend level.
    fn fetch(&self, collection: &str, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Stores `doc` under `key` only if the key currently holds nothing.
    ///
    /// Returns `true` when the document was inserted, `false` when the key
    /// was already occupied (in which case nothing is written). This is the
    /// compare-and-insert primitive behind idempotent create.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails at the backend level.
    fn insert_if_absent(&self, collection: &str, key: &str, doc: &[u8]) -> StorageResult<bool>;

    /// Replaces the document under `key` only if it currently holds exactly
    /// `expected`.
    ///
    /// Returns `true` when the replacement happened, `false` when the key
    /// was absent or held different bytes (in which case nothing is
    /// written). This is the compare-and-swap primitive behind lost-update-
    /// free read-modify-write; callers re-fetch and retry on `false`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails at the backend level.
    fn compare_and_put(
        &self,
        collection: &str,
        key: &str,
        expected: &[u8],
        doc: &[u8],
    ) -> StorageResult<bool>;

    /// Stores `doc` under `key`, replacing any existing document.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails at the backend level.
    fn put(&self, collection: &str, key: &str, doc: &[u8]) -> StorageResult<()>;

    /// Physically removes the document stored under `key`.
    ///
    /// Returns `true` when a document was removed, `false` when the key was
    /// already absent. Removal of an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the removal fails at the backend level.
    fn remove(&self, collection: &str, key: &str) -> StorageResult<bool>;

    /// Returns all `(key, document)` pairs in `collection`, in key order.
    ///
    /// An unknown collection scans as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the scan fails at the backend level.
    fn scan(&self, collection: &str) -> StorageResult<Vec<(String, Vec<u8>)>>;
}

//! Lifecycle store: record state transitions and server timestamps.
//!
//! State machine per identifier:
//!
//! ```text
//! absent ──create──▶ LIVE ──soft_delete──▶ SOFT_DELETED
//!                     │                        │
//!                     └────────purge───────────┴──▶ (absent again)
//! ```
//!
//! No transition leaves the purged (absent) state except a fresh create.
//! All per-identifier atomicity is delegated to the storage collaborator:
//! create uses `insert_if_absent`, and the read-modify-write transitions
//! (update, soft delete) replace the record through `compare_and_put` over
//! the previously fetched bytes, retrying when a concurrent write lands in
//! between. The store itself takes no locks and never blocks on another
//! in-process request.

use crate::clock::Clock;
use crate::error::CoreResult;
use crate::record::{DeletionState, Record};
use crate::scope::{AuthSubject, Scope};
use crate::types::RecordId;
use pulsestore_storage::DocumentBackend;
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of a write operation.
///
/// Idempotent repeats are expected outcomes, not errors, so the boundary
/// can map them to status codes without exception handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// A new record was inserted.
    Created,
    /// A live or soft-deleted record already exists at the identifier;
    /// nothing was written.
    AlreadyExists,
    /// An existing live record was updated in place.
    Updated,
    /// No record exists at the identifier to update.
    NotFound,
}

/// Outcome of a soft delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The record transitioned to soft-deleted.
    Deleted,
    /// The record was already soft-deleted; nothing changed.
    AlreadyDeleted,
    /// No record exists at the identifier.
    NotFound,
}

/// Owns record lifecycle transitions over a storage collaborator.
///
/// Every operation takes the resolved [`AuthSubject`] explicitly and checks
/// the required scope before touching storage.
pub struct LifecycleStore {
    backend: Arc<dyn DocumentBackend>,
    clock: Arc<dyn Clock>,
}

impl LifecycleStore {
    /// Creates a lifecycle store over the given backend and clock.
    pub fn new(backend: Arc<dyn DocumentBackend>, clock: Arc<dyn Clock>) -> Self {
        Self { backend, clock }
    }

    /// Inserts a record, idempotently.
    ///
    /// Requires [`Scope::Create`]. When a live or soft-deleted record
    /// already occupies the identifier the call is a no-op reported as
    /// [`WriteOutcome::AlreadyExists`]; a purged identifier is simply
    /// absent, so re-creating there behaves as a fresh insert.
    ///
    /// The record's `srv_created`/`srv_modified` are stamped here, never
    /// taken from the caller.
    ///
    /// # Errors
    ///
    /// `Unauthorized` without the create scope; storage or codec failures.
    pub fn create(
        &self,
        collection: &str,
        subject: &AuthSubject,
        mut record: Record,
    ) -> CoreResult<WriteOutcome> {
        subject.require(Scope::Create)?;

        let now = self.clock.now_ms();
        record.srv_created = now;
        record.srv_modified = now;
        record.state = DeletionState::Live;

        let inserted =
            self.backend
                .insert_if_absent(collection, record.id.as_str(), &record.to_bytes()?)?;
        if inserted {
            debug!(collection, id = %record.id, "record created");
            Ok(WriteOutcome::Created)
        } else {
            debug!(collection, id = %record.id, "create is idempotent repeat");
            Ok(WriteOutcome::AlreadyExists)
        }
    }

    /// Replaces the payload of an existing live record.
    ///
    /// Requires [`Scope::Update`]. Refreshes `srv_modified` and preserves
    /// the original `srv_created`. Soft-deleted records are not updatable;
    /// they report [`WriteOutcome::NotFound`] like absent ones.
    ///
    /// # Errors
    ///
    /// `Unauthorized` without the update scope; storage or codec failures.
    pub fn update(
        &self,
        collection: &str,
        subject: &AuthSubject,
        mut record: Record,
    ) -> CoreResult<WriteOutcome> {
        subject.require(Scope::Update)?;

        loop {
            let Some(prior) = self.backend.fetch(collection, record.id.as_str())? else {
                return Ok(WriteOutcome::NotFound);
            };
            let existing = Record::from_bytes(&prior)?;
            if existing.state != DeletionState::Live {
                return Ok(WriteOutcome::NotFound);
            }

            record.srv_created = existing.srv_created;
            record.srv_modified = self.clock.now_ms();
            record.state = DeletionState::Live;
            let swapped = self.backend.compare_and_put(
                collection,
                record.id.as_str(),
                &prior,
                &record.to_bytes()?,
            )?;
            if swapped {
                debug!(collection, id = %record.id, "record updated");
                return Ok(WriteOutcome::Updated);
            }
            debug!(collection, id = %record.id, "update lost a write race, retrying");
        }
    }

    /// Looks up a record regardless of deletion state.
    ///
    /// Requires [`Scope::Read`]. Returns `None` for identifiers that never
    /// existed or were purged; the caller decides visibility of
    /// soft-deleted records (see [`crate::read`]).
    ///
    /// # Errors
    ///
    /// `Unauthorized` without the read scope; storage or codec failures.
    pub fn get(
        &self,
        collection: &str,
        subject: &AuthSubject,
        id: &RecordId,
    ) -> CoreResult<Option<Record>> {
        subject.require(Scope::Read)?;
        self.load(collection, id)
    }

    /// Marks a record soft-deleted, retaining payload and timestamps.
    ///
    /// Requires [`Scope::Delete`]. Refreshes `srv_modified`. Idempotent on
    /// already-soft-deleted records.
    ///
    /// # Errors
    ///
    /// `Unauthorized` without the delete scope; storage or codec failures.
    pub fn soft_delete(
        &self,
        collection: &str,
        subject: &AuthSubject,
        id: &RecordId,
    ) -> CoreResult<DeleteOutcome> {
        subject.require(Scope::Delete)?;

        loop {
            let Some(prior) = self.backend.fetch(collection, id.as_str())? else {
                return Ok(DeleteOutcome::NotFound);
            };
            let mut record = Record::from_bytes(&prior)?;
            if record.state == DeletionState::SoftDeleted {
                return Ok(DeleteOutcome::AlreadyDeleted);
            }

            record.state = DeletionState::SoftDeleted;
            record.srv_modified = self.clock.now_ms();
            let swapped =
                self.backend
                    .compare_and_put(collection, id.as_str(), &prior, &record.to_bytes()?)?;
            if swapped {
                debug!(collection, %id, "record soft-deleted");
                return Ok(DeleteOutcome::Deleted);
            }
            debug!(collection, %id, "soft delete lost a write race, retrying");
        }
    }

    /// Physically removes a record from any state.
    ///
    /// Requires [`Scope::Delete`]. Unconditionally succeeds, including for
    /// identifiers that never existed - permanent delete is deliberately
    /// idempotent at the contract level.
    ///
    /// # Errors
    ///
    /// `Unauthorized` without the delete scope; storage failures.
    pub fn purge(&self, collection: &str, subject: &AuthSubject, id: &RecordId) -> CoreResult<()> {
        subject.require(Scope::Delete)?;

        let removed = self.backend.remove(collection, id.as_str())?;
        if removed {
            info!(collection, %id, "record purged");
        }
        Ok(())
    }

    fn load(&self, collection: &str, id: &RecordId) -> CoreResult<Option<Record>> {
        match self.backend.fetch(collection, id.as_str())? {
            Some(bytes) => Ok(Some(Record::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }
}

impl std::fmt::Debug for LifecycleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::identifier::derive_identifier;
    use crate::normalize::{normalize, RecordInput};
    use crate::scope::ScopeSet;
    use pulsestore_storage::MemoryBackend;
    use serde_json::json;

    const COLLECTION: &str = "devicestatus";
    const T0: u64 = 1_700_000_000_000;

    fn store_at(now: u64) -> LifecycleStore {
        LifecycleStore::new(Arc::new(MemoryBackend::new()), Arc::new(FixedClock(now)))
    }

    fn admin() -> AuthSubject {
        AuthSubject::new("tester", ScopeSet::all())
    }

    fn sample_record() -> Record {
        let doc = json!({
            "date": T0,
            "app": "uploader",
            "device": "dexcom",
            "uploaderBattery": 58
        });
        normalize(RecordInput::classify(doc).unwrap(), "tester", T0).unwrap()
    }

    #[test]
    fn create_then_get_roundtrip() {
        let store = store_at(T0 + 100);
        let record = sample_record();
        let id = record.id.clone();

        assert_eq!(
            store.create(COLLECTION, &admin(), record).unwrap(),
            WriteOutcome::Created
        );

        let found = store.get(COLLECTION, &admin(), &id).unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.srv_created, T0 + 100);
        assert_eq!(found.srv_modified, T0 + 100);
        assert!(found.is_live());
    }

    #[test]
    fn create_is_idempotent() {
        let store = store_at(T0 + 100);

        assert_eq!(
            store.create(COLLECTION, &admin(), sample_record()).unwrap(),
            WriteOutcome::Created
        );
        assert_eq!(
            store.create(COLLECTION, &admin(), sample_record()).unwrap(),
            WriteOutcome::AlreadyExists
        );

        // Exactly one record, with its original timestamps
        let id = sample_record().id;
        let found = store.get(COLLECTION, &admin(), &id).unwrap().unwrap();
        assert_eq!(found.srv_created, T0 + 100);
    }

    #[test]
    fn create_after_purge_is_fresh() {
        let store = store_at(T0 + 100);
        let id = sample_record().id;

        store.create(COLLECTION, &admin(), sample_record()).unwrap();
        store.purge(COLLECTION, &admin(), &id).unwrap();

        assert_eq!(
            store.create(COLLECTION, &admin(), sample_record()).unwrap(),
            WriteOutcome::Created
        );
    }

    #[test]
    fn update_refreshes_modified_only() {
        let backend: Arc<dyn DocumentBackend> = Arc::new(MemoryBackend::new());
        let create_store =
            LifecycleStore::new(Arc::clone(&backend), Arc::new(FixedClock(T0 + 100)));
        let update_store = LifecycleStore::new(backend, Arc::new(FixedClock(T0 + 500)));

        create_store
            .create(COLLECTION, &admin(), sample_record())
            .unwrap();

        let mut updated = sample_record();
        updated
            .payload
            .insert("uploaderBattery".into(), json!(31));
        assert_eq!(
            update_store.update(COLLECTION, &admin(), updated).unwrap(),
            WriteOutcome::Updated
        );

        let id = sample_record().id;
        let found = update_store.get(COLLECTION, &admin(), &id).unwrap().unwrap();
        assert_eq!(found.srv_created, T0 + 100);
        assert_eq!(found.srv_modified, T0 + 500);
        assert_eq!(
            found.payload.get("uploaderBattery"),
            Some(&json!(31))
        );
    }

    #[test]
    fn update_missing_record_is_not_found() {
        let store = store_at(T0);
        assert_eq!(
            store.update(COLLECTION, &admin(), sample_record()).unwrap(),
            WriteOutcome::NotFound
        );
    }

    #[test]
    fn soft_delete_lifecycle() {
        let store = store_at(T0 + 100);
        let id = sample_record().id;
        store.create(COLLECTION, &admin(), sample_record()).unwrap();

        assert_eq!(
            store.soft_delete(COLLECTION, &admin(), &id).unwrap(),
            DeleteOutcome::Deleted
        );
        assert_eq!(
            store.soft_delete(COLLECTION, &admin(), &id).unwrap(),
            DeleteOutcome::AlreadyDeleted
        );

        // Payload and timestamps are retained
        let found = store.get(COLLECTION, &admin(), &id).unwrap().unwrap();
        assert_eq!(found.state, DeletionState::SoftDeleted);
        assert!(found.payload.contains_key("uploaderBattery"));
        assert!(found.srv_created <= found.srv_modified);
    }

    #[test]
    fn soft_delete_missing_record_is_not_found() {
        let store = store_at(T0);
        let id = derive_identifier("none", "none", 0);
        assert_eq!(
            store.soft_delete(COLLECTION, &admin(), &id).unwrap(),
            DeleteOutcome::NotFound
        );
    }

    #[test]
    fn purge_always_succeeds() {
        let store = store_at(T0);
        let id = derive_identifier("never", "existed", 0);

        // Never-existing identifier
        store.purge(COLLECTION, &admin(), &id).unwrap();

        // Live record
        let record = sample_record();
        let live_id = record.id.clone();
        store.create(COLLECTION, &admin(), record).unwrap();
        store.purge(COLLECTION, &admin(), &live_id).unwrap();
        assert!(store.get(COLLECTION, &admin(), &live_id).unwrap().is_none());

        // Repeat purge
        store.purge(COLLECTION, &admin(), &live_id).unwrap();
    }

    #[test]
    fn soft_deleted_then_purged_is_gone() {
        let store = store_at(T0);
        let id = sample_record().id;
        store.create(COLLECTION, &admin(), sample_record()).unwrap();
        store.soft_delete(COLLECTION, &admin(), &id).unwrap();
        store.purge(COLLECTION, &admin(), &id).unwrap();
        assert!(store.get(COLLECTION, &admin(), &id).unwrap().is_none());
    }

    /// A backend that applies a queued write right before the first
    /// compare-and-put attempt, simulating a concurrent writer landing
    /// between a transition's fetch and its swap.
    struct RacingBackend {
        inner: MemoryBackend,
        pending: parking_lot::Mutex<Option<(String, String, Vec<u8>)>>,
    }

    impl RacingBackend {
        fn new() -> Self {
            Self {
                inner: MemoryBackend::new(),
                pending: parking_lot::Mutex::new(None),
            }
        }

        fn queue_write(&self, collection: &str, key: &str, doc: Vec<u8>) {
            *self.pending.lock() = Some((collection.to_string(), key.to_string(), doc));
        }
    }

    impl DocumentBackend for RacingBackend {
        fn fetch(
            &self,
            collection: &str,
            key: &str,
        ) -> pulsestore_storage::StorageResult<Option<Vec<u8>>> {
            self.inner.fetch(collection, key)
        }

        fn insert_if_absent(
            &self,
            collection: &str,
            key: &str,
            doc: &[u8],
        ) -> pulsestore_storage::StorageResult<bool> {
            self.inner.insert_if_absent(collection, key, doc)
        }

        fn compare_and_put(
            &self,
            collection: &str,
            key: &str,
            expected: &[u8],
            doc: &[u8],
        ) -> pulsestore_storage::StorageResult<bool> {
            if let Some((c, k, bytes)) = self.pending.lock().take() {
                self.inner.put(&c, &k, &bytes)?;
            }
            self.inner.compare_and_put(collection, key, expected, doc)
        }

        fn put(
            &self,
            collection: &str,
            key: &str,
            doc: &[u8],
        ) -> pulsestore_storage::StorageResult<()> {
            self.inner.put(collection, key, doc)
        }

        fn remove(&self, collection: &str, key: &str) -> pulsestore_storage::StorageResult<bool> {
            self.inner.remove(collection, key)
        }

        fn scan(
            &self,
            collection: &str,
        ) -> pulsestore_storage::StorageResult<Vec<(String, Vec<u8>)>> {
            self.inner.scan(collection)
        }
    }

    #[test]
    fn soft_delete_preserves_racing_update() {
        let backend = Arc::new(RacingBackend::new());
        let store = LifecycleStore::new(
            Arc::clone(&backend) as Arc<dyn DocumentBackend>,
            Arc::new(FixedClock(T0 + 100)),
        );
        let id = sample_record().id;
        store.create(COLLECTION, &admin(), sample_record()).unwrap();

        // A writer replaces the payload between soft delete's fetch and swap
        let mut racing = sample_record();
        racing.payload.insert("uploaderBattery".into(), json!(7));
        racing.srv_created = T0 + 100;
        racing.srv_modified = T0 + 200;
        backend.queue_write(COLLECTION, id.as_str(), racing.to_bytes().unwrap());

        assert_eq!(
            store.soft_delete(COLLECTION, &admin(), &id).unwrap(),
            DeleteOutcome::Deleted
        );

        // Both writes survive: the racing payload and the deletion mark
        let found = store.get(COLLECTION, &admin(), &id).unwrap().unwrap();
        assert_eq!(found.state, DeletionState::SoftDeleted);
        assert_eq!(found.payload.get("uploaderBattery"), Some(&json!(7)));
    }

    #[test]
    fn update_cannot_resurrect_racing_soft_delete() {
        let backend = Arc::new(RacingBackend::new());
        let store = LifecycleStore::new(
            Arc::clone(&backend) as Arc<dyn DocumentBackend>,
            Arc::new(FixedClock(T0 + 100)),
        );
        let id = sample_record().id;
        store.create(COLLECTION, &admin(), sample_record()).unwrap();

        // A deleter marks the record between update's fetch and swap
        let mut racing = sample_record();
        racing.state = DeletionState::SoftDeleted;
        racing.srv_created = T0 + 100;
        racing.srv_modified = T0 + 200;
        backend.queue_write(COLLECTION, id.as_str(), racing.to_bytes().unwrap());

        let mut updated = sample_record();
        updated.payload.insert("uploaderBattery".into(), json!(7));
        assert_eq!(
            store.update(COLLECTION, &admin(), updated).unwrap(),
            WriteOutcome::NotFound
        );

        let found = store.get(COLLECTION, &admin(), &id).unwrap().unwrap();
        assert_eq!(found.state, DeletionState::SoftDeleted);
    }

    #[test]
    fn operations_require_their_scope() {
        let store = store_at(T0);
        let reader = AuthSubject::new("reader", ScopeSet::empty().with(Scope::Read));
        let id = sample_record().id;

        assert!(store
            .create(COLLECTION, &reader, sample_record())
            .unwrap_err()
            .is_unauthorized());
        assert!(store
            .soft_delete(COLLECTION, &reader, &id)
            .unwrap_err()
            .is_unauthorized());
        assert!(store
            .purge(COLLECTION, &reader, &id)
            .unwrap_err()
            .is_unauthorized());
        assert!(store.get(COLLECTION, &reader, &id).unwrap().is_none());
    }

    #[test]
    fn collections_are_isolated() {
        let store = store_at(T0);
        let id = sample_record().id;
        store.create(COLLECTION, &admin(), sample_record()).unwrap();
        assert!(store.get("treatments", &admin(), &id).unwrap().is_none());
    }
}

//! Canonical record representation and lifecycle state.

use crate::types::RecordId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Well-known field names shared by both ingestion shapes.
pub mod fields {
    /// Device that reported the event.
    pub const DEVICE: &str = "device";
    /// Application that uploaded the event.
    pub const APP: &str = "app";
    /// Logical event time, unix millis.
    pub const DATE: &str = "date";
    /// Textual ISO-8601 event time used by the legacy shape.
    pub const CREATED_AT: &str = "created_at";
    /// Storage-assigned primary key of the legacy shape.
    pub const LEGACY_ID: &str = "_id";
    /// Deterministic identifier of the current shape.
    pub const IDENTIFIER: &str = "identifier";
    /// Authenticated principal that created the record.
    pub const SUBJECT: &str = "subject";
    /// Server-assigned creation time, unix millis.
    pub const SRV_CREATED: &str = "srvCreated";
    /// Server-assigned last-modification time, unix millis.
    pub const SRV_MODIFIED: &str = "srvModified";
}

/// Deletion state of a stored record.
///
/// `PURGED` has no variant here: a purged record is physically absent from
/// storage and indistinguishable from one that never existed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeletionState {
    /// The record is visible to normal reads.
    Live,
    /// The record is retained but hidden; direct lookups signal "gone".
    SoftDeleted,
}

/// Which ingestion path produced the record.
///
/// Internal bookkeeping only - the origin never appears in any projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Origin {
    /// Created through the deterministic-identifier path.
    CurrentApi,
    /// Created through the legacy primary-key path.
    LegacyApi,
}

/// The canonical in-memory and stored form of a record.
///
/// Both ingestion shapes normalize into this one type (see
/// [`crate::normalize`]). The `event_time` is cached at normalization so
/// freshness checks never re-parse the payload's timestamp field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// The record's logical identity.
    pub id: RecordId,
    /// Open mapping of domain fields, including `subject`.
    pub payload: Map<String, Value>,
    /// Logical event time in unix millis.
    pub event_time: u64,
    /// Server-assigned creation time, set once.
    pub srv_created: u64,
    /// Server-assigned modification time, refreshed on every mutation.
    pub srv_modified: u64,
    /// Current deletion state.
    pub state: DeletionState,
    /// Which ingestion path produced the record.
    pub origin: Origin,
}

impl Record {
    /// Returns `true` when the record is visible to normal reads.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.state == DeletionState::Live
    }

    /// Returns the authenticated principal recorded at creation, if any.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.payload.get(fields::SUBJECT).and_then(Value::as_str)
    }

    /// Encodes the record for storage.
    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Decodes a record from its stored form.
    pub fn from_bytes(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

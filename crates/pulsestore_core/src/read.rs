//! Conditional-read evaluation.
//!
//! Decides the HTTP-visible outcome of a read from a record's deletion
//! state and an optional client-supplied freshness marker ("I already have
//! the version as of this time"). Not-found, gone and not-modified are
//! normal outcomes here, never errors - the boundary maps each variant to
//! a status code through a fixed table.

use crate::record::{DeletionState, Record};

/// Outcome of a conditional read.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    /// The record is live and newer than the marker; payload included.
    Ok(Record),
    /// The marker is at or after the record's event time; payload withheld.
    NotModified,
    /// The record exists but was intentionally soft-deleted.
    Gone,
    /// The record never existed or was purged.
    NotFound,
}

/// Evaluates a read against an optional freshness marker (unix millis).
///
/// Freshness compares the record's **logical event time** - the domain
/// timestamp - not `srvModified`. The boundary is inclusive: a marker equal
/// to the event time counts as not-modified, favoring cache hits.
#[must_use]
pub fn evaluate(lookup: Option<Record>, marker_ms: Option<u64>) -> ReadOutcome {
    let Some(record) = lookup else {
        return ReadOutcome::NotFound;
    };
    if record.state == DeletionState::SoftDeleted {
        return ReadOutcome::Gone;
    }
    match marker_ms {
        Some(marker) if record.event_time <= marker => ReadOutcome::NotModified,
        _ => ReadOutcome::Ok(record),
    }
}

//! Normalization of the two ingestion shapes into the canonical record.
//!
//! Documents arrive in one of two shapes:
//!
//! - **current**: numeric `date` event time, optionally a precomputed
//!   `identifier` (clients may derive it themselves for retries);
//! - **legacy**: a storage-assigned `_id` primary key and a textual
//!   ISO-8601 `created_at`, no `identifier`.
//!
//! Legacy documents never get a deterministic identifier retrofitted; their
//! identity for API purposes is the legacy primary key rendered as a
//! string, and the deriver is not invoked for them.

use crate::error::{CoreError, CoreResult};
use crate::identifier::{derive_identifier, identity_from_payload};
use crate::record::{fields, DeletionState, Origin, Record};
use crate::types::RecordId;
use chrono::DateTime;
use serde_json::{Map, Value};

/// An incoming document, tagged by the ingestion path that produced it.
#[derive(Debug, Clone)]
pub enum RecordInput {
    /// Current-shape document (numeric `date`, derived identifier).
    FromCurrentApi(Map<String, Value>),
    /// Legacy-shape document (`_id` primary key, textual `created_at`).
    FromLegacyApi(Map<String, Value>),
}

impl RecordInput {
    /// Classifies a raw JSON document into its ingestion shape.
    ///
    /// A document carrying a storage primary key (`_id`) and no
    /// `identifier` is legacy-shaped; everything else is current-shaped.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MalformedRecord`] when the body is not a JSON
    /// object.
    pub fn classify(doc: Value) -> CoreResult<Self> {
        let Value::Object(map) = doc else {
            return Err(CoreError::malformed("document body must be a JSON object"));
        };
        if map.contains_key(fields::LEGACY_ID) && !map.contains_key(fields::IDENTIFIER) {
            Ok(RecordInput::FromLegacyApi(map))
        } else {
            Ok(RecordInput::FromCurrentApi(map))
        }
    }
}

/// Normalizes an incoming document into the canonical [`Record`].
///
/// The caller supplies the authenticated principal (stamped into the
/// payload as `subject`) and the server time for the initial
/// `srvCreated`/`srvModified` pair.
///
/// # Errors
///
/// Returns [`CoreError::MalformedRecord`] or [`CoreError::InvalidField`]
/// when required identity fields (device, app, timestamp) are absent or
/// mistyped in either shape.
pub fn normalize(input: RecordInput, subject: &str, now_ms: u64) -> CoreResult<Record> {
    match input {
        RecordInput::FromCurrentApi(payload) => normalize_current(payload, subject, now_ms),
        RecordInput::FromLegacyApi(payload) => normalize_legacy(payload, subject, now_ms),
    }
}

fn normalize_current(mut payload: Map<String, Value>, subject: &str, now_ms: u64) -> CoreResult<Record> {
    let (device, app, date) = identity_from_payload(&payload)?;

    // The identifier is always the server's derivation. A client-supplied
    // one is only accepted when it matches; anything else would park the
    // record away from its deterministic identity.
    let id = derive_identifier(&device, &app, date);
    if let Some(given) = payload.get(fields::IDENTIFIER).and_then(Value::as_str) {
        if given != id.as_str() {
            return Err(CoreError::invalid_field(
                fields::IDENTIFIER,
                "does not match the identifier derived from the identity fields",
            ));
        }
    }
    payload.insert(fields::IDENTIFIER.into(), Value::String(id.to_string()));
    payload.insert(fields::SUBJECT.into(), Value::String(subject.to_string()));

    Ok(Record {
        id,
        payload,
        event_time: date,
        srv_created: now_ms,
        srv_modified: now_ms,
        state: DeletionState::Live,
        origin: Origin::CurrentApi,
    })
}

fn normalize_legacy(mut payload: Map<String, Value>, subject: &str, now_ms: u64) -> CoreResult<Record> {
    let id = match payload.remove(fields::LEGACY_ID) {
        Some(Value::String(s)) => RecordId::from(s),
        Some(other) => RecordId::from(other.to_string()),
        None => return Err(CoreError::malformed("legacy document missing _id")),
    };

    for field in [fields::DEVICE, fields::APP] {
        if !payload.get(field).is_some_and(Value::is_string) {
            return Err(CoreError::malformed(format!(
                "missing required field {field}"
            )));
        }
    }

    // The legacy event time is the textual created_at; a numeric date, when
    // present, already agrees with it and takes precedence as-is.
    let event_time = match payload.get(fields::DATE).and_then(Value::as_u64) {
        Some(date) => date,
        None => parse_created_at(&payload)?,
    };

    payload.insert(fields::SUBJECT.into(), Value::String(subject.to_string()));

    Ok(Record {
        id,
        payload,
        event_time,
        srv_created: now_ms,
        srv_modified: now_ms,
        state: DeletionState::Live,
        origin: Origin::LegacyApi,
    })
}

fn parse_created_at(payload: &Map<String, Value>) -> CoreResult<u64> {
    let text = payload
        .get(fields::CREATED_AT)
        .and_then(Value::as_str)
        .ok_or_else(|| {
            CoreError::malformed(format!("missing required field {}", fields::CREATED_AT))
        })?;
    let parsed = DateTime::parse_from_rfc3339(text)
        .map_err(|e| CoreError::invalid_field(fields::CREATED_AT, e.to_string()))?;
    Ok(parsed.timestamp_millis().max(0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NOW: u64 = 1_700_000_100_000;

    fn current_doc() -> Value {
        json!({
            "date": 1_700_000_000_000_u64,
            "app": "uploader",
            "device": "dexcom",
            "uploaderBattery": 58
        })
    }

    fn legacy_doc() -> Value {
        json!({
            "_id": "655a7d580000000000000000",
            "created_at": "2023-11-14T22:13:20.000Z",
            "app": "uploader",
            "device": "dexcom",
            "uploaderBattery": 58
        })
    }

    #[test]
    fn classify_current_shape() {
        let input = RecordInput::classify(current_doc()).unwrap();
        assert!(matches!(input, RecordInput::FromCurrentApi(_)));
    }

    #[test]
    fn classify_legacy_shape() {
        let input = RecordInput::classify(legacy_doc()).unwrap();
        assert!(matches!(input, RecordInput::FromLegacyApi(_)));
    }

    #[test]
    fn classify_rejects_non_object() {
        assert!(RecordInput::classify(json!([1, 2, 3])).is_err());
    }

    #[test]
    fn current_gets_derived_identifier() {
        let input = RecordInput::classify(current_doc()).unwrap();
        let record = normalize(input, "tester", NOW).unwrap();

        let expected = derive_identifier("dexcom", "uploader", 1_700_000_000_000);
        assert_eq!(record.id, expected);
        assert_eq!(record.origin, Origin::CurrentApi);
        assert_eq!(record.event_time, 1_700_000_000_000);
        assert_eq!(record.srv_created, NOW);
        assert_eq!(record.srv_modified, NOW);
        assert_eq!(record.subject(), Some("tester"));
        assert_eq!(
            record.payload.get("identifier").and_then(Value::as_str),
            Some(expected.as_str())
        );
    }

    #[test]
    fn current_accepts_matching_client_identifier() {
        let mut doc = current_doc();
        let derived = derive_identifier("dexcom", "uploader", 1_700_000_000_000);
        doc["identifier"] = json!(derived.as_str());

        let input = RecordInput::classify(doc).unwrap();
        let record = normalize(input, "tester", NOW).unwrap();
        assert_eq!(record.id, derived);
    }

    #[test]
    fn current_rejects_forged_client_identifier() {
        let mut doc = current_doc();
        doc["identifier"] = json!("00000000000000000000000000000000");

        let input = RecordInput::classify(doc).unwrap();
        let err = normalize(input, "tester", NOW).unwrap_err();
        assert!(
            matches!(err, CoreError::InvalidField { ref field, .. } if field.as_str() == "identifier")
        );
    }

    #[test]
    fn legacy_uses_primary_key_as_identifier() {
        let input = RecordInput::classify(legacy_doc()).unwrap();
        let record = normalize(input, "tester", NOW).unwrap();

        assert_eq!(record.id.as_str(), "655a7d580000000000000000");
        assert_eq!(record.origin, Origin::LegacyApi);
        // _id must not leak into the payload
        assert!(!record.payload.contains_key("_id"));
        // created_at stays part of the payload
        assert!(record.payload.contains_key("created_at"));
    }

    #[test]
    fn legacy_event_time_from_created_at() {
        let mut doc = legacy_doc();
        doc.as_object_mut().unwrap().remove("date");

        let input = RecordInput::classify(doc).unwrap();
        let record = normalize(input, "tester", NOW).unwrap();
        assert_eq!(record.event_time, 1_700_000_000_000);
    }

    #[test]
    fn legacy_numeric_date_takes_precedence() {
        let mut doc = legacy_doc();
        doc["date"] = json!(1_699_999_999_000_u64);

        let input = RecordInput::classify(doc).unwrap();
        let record = normalize(input, "tester", NOW).unwrap();
        assert_eq!(record.event_time, 1_699_999_999_000);
    }

    #[test]
    fn current_missing_device_is_malformed() {
        let mut doc = current_doc();
        doc.as_object_mut().unwrap().remove("device");

        let input = RecordInput::classify(doc).unwrap();
        let err = normalize(input, "tester", NOW).unwrap_err();
        assert!(matches!(err, CoreError::MalformedRecord { .. }));
    }

    #[test]
    fn legacy_missing_timestamp_is_malformed() {
        let mut doc = legacy_doc();
        let map = doc.as_object_mut().unwrap();
        map.remove("created_at");
        map.remove("date");

        let input = RecordInput::classify(doc).unwrap();
        assert!(normalize(input, "tester", NOW).is_err());
    }

    #[test]
    fn legacy_bad_created_at_is_invalid() {
        let mut doc = legacy_doc();
        doc["created_at"] = json!("yesterday");
        doc.as_object_mut().unwrap().remove("date");

        let input = RecordInput::classify(doc).unwrap();
        assert!(normalize(input, "tester", NOW).is_err());
    }
}

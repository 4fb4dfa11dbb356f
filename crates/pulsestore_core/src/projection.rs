//! Field projection: the externally visible subset of a record.

use crate::record::{fields, Record};
use serde_json::{Map, Value};

/// Sentinel meaning "all fields" in the `fields` query parameter.
pub const ALL_FIELDS: &str = "_all";

/// A caller-requested field set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSelection {
    /// Full canonical payload plus system-assigned fields.
    All,
    /// An explicit list of field names; absent names are silently omitted.
    Fields(Vec<String>),
}

impl FieldSelection {
    /// Parses the `fields` query parameter.
    ///
    /// An omitted or empty parameter and the `_all` sentinel both mean the
    /// full projection; anything else is a comma-separated field list.
    #[must_use]
    pub fn parse(param: Option<&str>) -> Self {
        match param.map(str::trim) {
            None | Some("") | Some(ALL_FIELDS) => FieldSelection::All,
            Some(list) => FieldSelection::Fields(
                list.split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
        }
    }
}

/// Projects a record to its externally visible fields.
///
/// The projection base is the record's payload plus the system-assigned
/// `identifier`, `srvCreated` and `srvModified` (numeric). Internal-only
/// bookkeeping (deletion state, origin, the cached event time) never
/// appears in any projection.
#[must_use]
pub fn project(record: &Record, selection: &FieldSelection) -> Map<String, Value> {
    let mut base = record.payload.clone();
    base.insert(
        fields::IDENTIFIER.into(),
        Value::String(record.id.to_string()),
    );
    base.insert(fields::SRV_CREATED.into(), Value::from(record.srv_created));
    base.insert(fields::SRV_MODIFIED.into(), Value::from(record.srv_modified));

    match selection {
        FieldSelection::All => base,
        FieldSelection::Fields(names) => {
            let mut projected = Map::new();
            for name in names {
                if let Some(value) = base.get(name) {
                    projected.insert(name.clone(), value.clone());
                }
            }
            projected
        }
    }
}

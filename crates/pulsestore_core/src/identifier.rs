//! Deterministic identifier derivation.
//!
//! A record's identity is a function of its identity-significant fields
//! only: `device`, `app` and `date`. The derivation is a versioned public
//! contract - any external caller can compute the same identifier from the
//! same fields, which is what makes create retries idempotent and lets
//! independent systems agree on identity.
//!
//! ## Contract (version 1)
//!
//! 1. Build the identity string `"1|" + device + "|" + app + "|" + date`,
//!    with `date` rendered as decimal unix millis.
//! 2. Hash the UTF-8 bytes with SHA-256.
//! 3. Hex-encode and truncate to 32 characters (128 bits).
//!
//! The version prefix is part of the hashed input, so adding
//! identity-significant fields in a future version cannot silently collide
//! with version-1 identifiers.

use crate::error::{CoreError, CoreResult};
use crate::record::fields;
use crate::types::RecordId;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Version of the field-ordering contract hashed into every identifier.
pub const IDENTITY_VERSION: u32 = 1;

/// Separator between identity fields in the canonical identity string.
const SEPARATOR: char = '|';

/// Length of the derived identifier in hex characters.
const IDENTIFIER_LEN: usize = 32;

/// Derives the deterministic identifier for the given identity fields.
///
/// Non-identity fields (readings, batteries, free-form metadata) must never
/// be passed here; they do not participate in identity.
#[must_use]
pub fn derive_identifier(device: &str, app: &str, date_ms: u64) -> RecordId {
    let canonical = format!("{IDENTITY_VERSION}{SEPARATOR}{device}{SEPARATOR}{app}{SEPARATOR}{date_ms}");
    let digest = Sha256::digest(canonical.as_bytes());
    let mut encoded = hex::encode(digest);
    encoded.truncate(IDENTIFIER_LEN);
    RecordId::new(encoded)
}

/// Extracts the identity-significant fields from a payload.
///
/// # Errors
///
/// Returns [`CoreError::MalformedRecord`] when a field is absent and
/// [`CoreError::InvalidField`] when it has the wrong type.
pub fn identity_from_payload(payload: &Map<String, Value>) -> CoreResult<(String, String, u64)> {
    let device = require_str(payload, fields::DEVICE)?;
    let app = require_str(payload, fields::APP)?;
    let date = payload
        .get(fields::DATE)
        .ok_or_else(|| CoreError::malformed(format!("missing required field {}", fields::DATE)))?
        .as_u64()
        .ok_or_else(|| CoreError::invalid_field(fields::DATE, "expected unix millis"))?;
    Ok((device, app, date))
}

fn require_str(payload: &Map<String, Value>, field: &str) -> CoreResult<String> {
    payload
        .get(field)
        .ok_or_else(|| CoreError::malformed(format!("missing required field {field}")))?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| CoreError::invalid_field(field, "expected a string"))
}

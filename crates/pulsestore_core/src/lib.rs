//! # Pulsestore Core
//!
//! The identifier, versioning and visibility engine of pulsestore.
//!
//! This crate provides:
//! - Deterministic, externally computable record identifiers
//! - Normalization of the current and legacy ingestion shapes
//! - Lifecycle transitions (create, update, soft delete, purge) with
//!   server-assigned timestamps
//! - Conditional-read evaluation (ok / not-modified / gone / not-found)
//! - Field projection for partial reads
//! - Scope checks against a resolved authenticated principal
//!
//! The storage engine, HTTP routing and token validation are external
//! collaborators consumed through narrow interfaces
//! ([`pulsestore_storage::DocumentBackend`], framework-agnostic handlers in
//! `pulsestore_server`, and [`scope::AuthSubject`] respectively).

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod clock;
pub mod error;
pub mod identifier;
pub mod normalize;
pub mod projection;
pub mod read;
pub mod record;
pub mod scope;
pub mod store;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{CoreError, CoreResult};
pub use identifier::{derive_identifier, identity_from_payload, IDENTITY_VERSION};
pub use normalize::{normalize, RecordInput};
pub use projection::{project, FieldSelection, ALL_FIELDS};
pub use read::{evaluate, ReadOutcome};
pub use record::{DeletionState, Origin, Record};
pub use scope::{AuthSubject, Scope, ScopeSet};
pub use store::{DeleteOutcome, LifecycleStore, WriteOutcome};
pub use types::RecordId;

//! # Pulsestore Storage
//!
//! Storage backend trait and implementations for pulsestore.
//!
//! This crate provides the lowest-level storage abstraction for the record
//! store. Backends are **opaque document stores** keyed by collection name
//! and document key - they do not interpret the bytes they hold.
//!
//! ## Design Principles
//!
//! - Backends are simple keyed byte stores (fetch, put, remove, scan)
//! - `insert_if_absent` must be atomic so that two concurrent creates for
//!   the same key resolve to exactly one stored document
//! - `compare_and_put` must be atomic so that read-modify-write callers can
//!   detect and retry conflicting writes instead of overwriting them
//! - Must be `Send + Sync` for concurrent access
//! - The core engine owns all document format interpretation
//!
//! ## Available Backends
//!
//! - [`MemoryBackend`] - For testing and ephemeral stores
//!
//! ## Example
//!
//! ```rust
//! use pulsestore_storage::{DocumentBackend, MemoryBackend};
//!
//! let backend = MemoryBackend::new();
//! assert!(backend.insert_if_absent("status", "abc", b"{}").unwrap());
//! assert!(!backend.insert_if_absent("status", "abc", b"{}").unwrap());
//! assert_eq!(backend.fetch("status", "abc").unwrap(), Some(b"{}".to_vec()));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod memory;

pub use backend::DocumentBackend;
pub use error::{StorageError, StorageResult};
pub use memory::MemoryBackend;

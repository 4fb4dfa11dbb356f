//! # Pulsestore Server
//!
//! Framework-agnostic HTTP boundary for the pulsestore record store.
//!
//! This crate provides:
//! - Request handlers for create, conditional read and delete
//! - Token resolution (static table or self-describing HMAC tokens)
//! - The fixed outcome-to-status mapping (200/201/204/304/400/401/404/410)
//!
//! # Architecture
//!
//! The actual HTTP routing layer is an external collaborator: it parses
//! the request line, query string and headers, then calls
//! [`RequestHandler::handle_create`], [`RequestHandler::handle_get`] or
//! [`RequestHandler::handle_delete`] and writes the returned
//! [`ApiResponse`] out. Nothing in this crate blocks on another in-process
//! request; all blocking happens at the storage boundary inside the core.
//!
//! # Authentication
//!
//! Tokens arrive as opaque strings (`?token=...`). A [`TokenResolver`]
//! turns them into a resolved principal with granted scopes; the core
//! checks the scope of each operation against that principal. Any
//! resolution failure surfaces as the structured 401 body
//! `{"status":401,"message":"Missing or bad access token or JWT"}`.
//!
//! ```rust
//! use pulsestore_core::{AuthSubject, LifecycleStore, ScopeSet, SystemClock};
//! use pulsestore_server::{
//!     HandlerContext, RequestHandler, ServerConfig, StaticTokenResolver,
//! };
//! use pulsestore_storage::MemoryBackend;
//! use std::sync::Arc;
//!
//! let store = Arc::new(LifecycleStore::new(
//!     Arc::new(MemoryBackend::new()),
//!     Arc::new(SystemClock),
//! ));
//! let resolver = StaticTokenResolver::new();
//! resolver.insert("secret", AuthSubject::new("uploader", ScopeSet::all()));
//!
//! let context = Arc::new(HandlerContext::new(
//!     ServerConfig::default(),
//!     store,
//!     Box::new(resolver),
//!     Arc::new(SystemClock),
//! ));
//! let handler = RequestHandler::new(context);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod auth;
mod config;
mod error;
mod handler;

pub use auth::{SignedTokenResolver, StaticTokenResolver, TokenResolver};
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::{parse_http_date_ms, ApiResponse, HandlerContext, RequestHandler};

//! Request handlers for the record store endpoints.
//!
//! The handlers are framework-agnostic: a routing layer (external
//! collaborator) extracts the path, query and header values and calls
//! these methods, then writes the returned [`ApiResponse`] out. Every
//! expected outcome maps to a status code through a fixed table - no
//! exceptions drive control flow.

use crate::auth::{SignedTokenResolver, TokenResolver};
use crate::config::ServerConfig;
use crate::error::ServerError;
use chrono::DateTime;
use pulsestore_core::{
    evaluate, normalize, project, AuthSubject, Clock, CoreError, DeleteOutcome, FieldSelection,
    LifecycleStore, ReadOutcome, RecordId, RecordInput, WriteOutcome,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

/// Message of the structured 401 body.
const UNAUTHORIZED_MESSAGE: &str = "Missing or bad access token or JWT";

/// A transport-neutral HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// JSON body, or `None` for an empty body.
    pub body: Option<Value>,
}

impl ApiResponse {
    /// A response with an empty body.
    #[must_use]
    pub fn empty(status: u16) -> Self {
        Self { status, body: None }
    }

    /// A response carrying a JSON body.
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: Some(body),
        }
    }

    /// The structured authentication-failure response.
    #[must_use]
    pub fn unauthorized() -> Self {
        Self::json(
            401,
            json!({ "status": 401, "message": UNAUTHORIZED_MESSAGE }),
        )
    }
}

/// Context shared by all request handlers.
pub struct HandlerContext {
    /// Server configuration.
    pub config: ServerConfig,
    /// The lifecycle store (shared across all handlers).
    pub store: Arc<LifecycleStore>,
    /// Token resolution collaborator.
    pub resolver: Box<dyn TokenResolver>,
    /// Server time source for normalization stamps.
    pub clock: Arc<dyn Clock>,
}

impl HandlerContext {
    /// Creates a new handler context.
    pub fn new(
        config: ServerConfig,
        store: Arc<LifecycleStore>,
        resolver: Box<dyn TokenResolver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            store,
            resolver,
            clock,
        }
    }

    /// Creates a context resolving tokens through a [`SignedTokenResolver`]
    /// built from the configured auth secret.
    ///
    /// Returns `None` when the configuration carries no secret; embedders
    /// that resolve tokens elsewhere pass their own resolver to
    /// [`HandlerContext::new`] instead.
    pub fn from_config(
        config: ServerConfig,
        store: Arc<LifecycleStore>,
        clock: Arc<dyn Clock>,
    ) -> Option<Self> {
        let resolver = Box::new(SignedTokenResolver::new(config.auth_secret.clone()?));
        Some(Self::new(config, store, resolver, clock))
    }
}

/// Handler for record store requests.
pub struct RequestHandler {
    context: Arc<HandlerContext>,
}

impl RequestHandler {
    /// Creates a new request handler.
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }

    /// Handles `POST /{collection}?token=T`.
    ///
    /// 201 with empty body on accepted create, including idempotent
    /// repeats; 400 on malformed records; 401 on auth failure; 404 on an
    /// unknown collection (independent of auth outcome).
    pub fn handle_create(&self, collection: &str, token: Option<&str>, body: Value) -> ApiResponse {
        if !self.context.config.knows_collection(collection) {
            return ApiResponse::empty(404);
        }
        let Some(subject) = self.resolve(token) else {
            return ApiResponse::unauthorized();
        };

        let record = match RecordInput::classify(body)
            .and_then(|input| normalize(input, &subject.subject, self.context.clock.now_ms()))
        {
            Ok(record) => record,
            Err(err) => return Self::fail(err),
        };

        match self.context.store.create(collection, &subject, record) {
            Ok(WriteOutcome::Created | WriteOutcome::AlreadyExists) => ApiResponse::empty(201),
            Ok(outcome) => {
                debug!(?outcome, "unexpected create outcome");
                ApiResponse::empty(500)
            }
            Err(err) => Self::fail(err),
        }
    }

    /// Handles `GET /{collection}/{identifier}?token=T&fields=F` with an
    /// optional `If-Modified-Since` header value.
    ///
    /// 200 with the projected body, 304/404/410 with empty bodies, 401
    /// with the structured auth body.
    pub fn handle_get(
        &self,
        collection: &str,
        identifier: &str,
        token: Option<&str>,
        fields: Option<&str>,
        if_modified_since: Option<&str>,
    ) -> ApiResponse {
        if !self.context.config.knows_collection(collection) {
            return ApiResponse::empty(404);
        }
        let Some(subject) = self.resolve(token) else {
            return ApiResponse::unauthorized();
        };

        let id = RecordId::from(identifier);
        let lookup = match self.context.store.get(collection, &subject, &id) {
            Ok(lookup) => lookup,
            Err(err) => return Self::fail(err),
        };

        let marker = if_modified_since.and_then(parse_http_date_ms);
        match evaluate(lookup, marker) {
            ReadOutcome::Ok(record) => {
                let selection = FieldSelection::parse(fields);
                ApiResponse::json(200, Value::Object(project(&record, &selection)))
            }
            ReadOutcome::NotModified => ApiResponse::empty(304),
            ReadOutcome::Gone => ApiResponse::empty(410),
            ReadOutcome::NotFound => ApiResponse::empty(404),
        }
    }

    /// Handles `DELETE /{collection}/{identifier}?token=T[&permanent=true]`.
    ///
    /// Soft delete returns 204 and is idempotent on already-deleted
    /// records; a missing target is 404. Permanent delete returns 204
    /// unconditionally, even for identifiers that never existed.
    pub fn handle_delete(
        &self,
        collection: &str,
        identifier: &str,
        token: Option<&str>,
        permanent: bool,
    ) -> ApiResponse {
        if !self.context.config.knows_collection(collection) {
            return ApiResponse::empty(404);
        }
        let Some(subject) = self.resolve(token) else {
            return ApiResponse::unauthorized();
        };

        let id = RecordId::from(identifier);
        if permanent {
            return match self.context.store.purge(collection, &subject, &id) {
                Ok(()) => ApiResponse::empty(204),
                Err(err) => Self::fail(err),
            };
        }

        match self.context.store.soft_delete(collection, &subject, &id) {
            Ok(DeleteOutcome::Deleted | DeleteOutcome::AlreadyDeleted) => ApiResponse::empty(204),
            Ok(DeleteOutcome::NotFound) => ApiResponse::empty(404),
            Err(err) => Self::fail(err),
        }
    }

    fn resolve(&self, token: Option<&str>) -> Option<AuthSubject> {
        token.and_then(|t| self.context.resolver.resolve(t))
    }

    fn fail(err: CoreError) -> ApiResponse {
        let err = ServerError::from(err);
        match err.status_code() {
            401 => ApiResponse::unauthorized(),
            status if err.is_client_error() => {
                ApiResponse::json(status, json!({ "status": status, "message": err.to_string() }))
            }
            status => ApiResponse::empty(status),
        }
    }
}

/// Parses an `If-Modified-Since` header value to unix millis.
///
/// Accepts RFC 2822 (the HTTP date format) and RFC 3339. Unparseable
/// values yield `None`, meaning "no freshness marker".
#[must_use]
pub fn parse_http_date_ms(value: &str) -> Option<u64> {
    DateTime::parse_from_rfc2822(value)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .ok()
        .map(|dt| dt.timestamp_millis().max(0) as u64)
}

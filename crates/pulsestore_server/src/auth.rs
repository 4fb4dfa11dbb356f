//! Access-token resolution for the boundary.
//!
//! Token issuance and storage belong to an external collaborator; the
//! boundary only needs to turn an opaque token string into a resolved
//! [`AuthSubject`] (principal plus granted scopes). Two resolvers are
//! provided:
//!
//! - [`StaticTokenResolver`] - a fixed token table, for tests and embedders
//!   that resolve tokens elsewhere;
//! - [`SignedTokenResolver`] - self-describing HMAC-SHA256 tokens with an
//!   expiry, for deployments without a token database.
//!
//! ## Signed token format
//!
//! `subject.scopes.expiry.signature` where `scopes` is a comma-separated
//! scope list, `expiry` is unix millis, and `signature` is the hex
//! HMAC-SHA256 of `subject|scopes|expiry` under the server secret.

use hmac::{Hmac, Mac};
use parking_lot::RwLock;
use pulsestore_core::{AuthSubject, ScopeSet};
use sha2::Sha256;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

type HmacSha256 = Hmac<Sha256>;

/// Resolves opaque token strings into authenticated principals.
///
/// Returning `None` means the token is missing from, unknown to, or
/// rejected by the collaborator; the handler surfaces that as 401.
pub trait TokenResolver: Send + Sync {
    /// Resolves `token` to a principal, or `None` when invalid.
    fn resolve(&self, token: &str) -> Option<AuthSubject>;
}

/// A resolver backed by a fixed token table.
#[derive(Default)]
pub struct StaticTokenResolver {
    tokens: RwLock<HashMap<String, AuthSubject>>,
}

impl StaticTokenResolver {
    /// Creates an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `token` as resolving to `subject`.
    pub fn insert(&self, token: impl Into<String>, subject: AuthSubject) {
        self.tokens.write().insert(token.into(), subject);
    }
}

impl TokenResolver for StaticTokenResolver {
    fn resolve(&self, token: &str) -> Option<AuthSubject> {
        self.tokens.read().get(token).cloned()
    }
}

/// A resolver for self-describing HMAC-signed tokens.
#[derive(Clone)]
pub struct SignedTokenResolver {
    secret: Vec<u8>,
}

impl SignedTokenResolver {
    /// Creates a resolver verifying against `secret`.
    #[must_use]
    pub fn new(secret: Vec<u8>) -> Self {
        Self { secret }
    }

    /// Creates a signed token for `subject` with the given scopes.
    ///
    /// `expiry_ms` is the absolute unix-millis instant after which the
    /// token stops resolving.
    #[must_use]
    pub fn create_token(&self, subject: &str, scopes: &str, expiry_ms: u64) -> String {
        let signature = self.sign(subject, scopes, expiry_ms);
        format!("{subject}.{scopes}.{expiry_ms}.{signature}")
    }

    fn sign(&self, subject: &str, scopes: &str, expiry_ms: u64) -> String {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size");
        mac.update(format!("{subject}|{scopes}|{expiry_ms}").as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn now_ms() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

impl TokenResolver for SignedTokenResolver {
    fn resolve(&self, token: &str) -> Option<AuthSubject> {
        let mut parts = token.rsplitn(3, '.');
        let signature = parts.next()?;
        let expiry: u64 = parts.next()?.parse().ok()?;
        let mut head = parts.next()?.splitn(2, '.');
        let subject = head.next()?;
        let scopes = head.next()?;

        // Constant-time comparison is handled by re-verifying through hmac
        let mut mac = HmacSha256::new_from_slice(&self.secret).ok()?;
        mac.update(format!("{subject}|{scopes}|{expiry}").as_bytes());
        let raw = hex::decode(signature).ok()?;
        mac.verify_slice(&raw).ok()?;

        if Self::now_ms() > expiry {
            return None;
        }

        Some(AuthSubject::new(subject, ScopeSet::parse(scopes)))
    }
}

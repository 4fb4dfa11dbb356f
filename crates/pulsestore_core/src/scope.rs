//! Operation scopes and the resolved authenticated principal.
//!
//! Token validation itself belongs to an external collaborator; the core
//! only consumes the result of it. Every lifecycle operation takes the
//! resolved [`AuthSubject`] as an explicit argument - there is no ambient
//! session state anywhere in the engine.

use crate::error::{CoreError, CoreResult};
use std::fmt;

/// A permission category granted to an authenticated principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Scope {
    /// Permission to create records.
    Create,
    /// Permission to read records.
    Read,
    /// Permission to update records in place.
    Update,
    /// Permission to soft-delete and purge records.
    Delete,
}

impl Scope {
    const ALL: [Scope; 4] = [Scope::Create, Scope::Read, Scope::Update, Scope::Delete];

    fn bit(self) -> u8 {
        match self {
            Scope::Create => 1 << 0,
            Scope::Read => 1 << 1,
            Scope::Update => 1 << 2,
            Scope::Delete => 1 << 3,
        }
    }

    /// Parses a scope from its lowercase wire name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "create" => Some(Scope::Create),
            "read" => Some(Scope::Read),
            "update" => Some(Scope::Update),
            "delete" => Some(Scope::Delete),
            _ => None,
        }
    }

    /// Returns the lowercase wire name of the scope.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Create => "create",
            Scope::Read => "read",
            Scope::Update => "update",
            Scope::Delete => "delete",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The set of scopes granted to a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScopeSet(u8);

impl ScopeSet {
    /// Creates an empty scope set.
    #[must_use]
    pub fn empty() -> Self {
        Self(0)
    }

    /// Creates a set granting every scope.
    #[must_use]
    pub fn all() -> Self {
        Scope::ALL.iter().fold(Self::empty(), |set, s| set.with(*s))
    }

    /// Returns a copy of the set with `scope` granted.
    #[must_use]
    pub fn with(self, scope: Scope) -> Self {
        Self(self.0 | scope.bit())
    }

    /// Returns `true` when `scope` is granted.
    #[must_use]
    pub fn contains(self, scope: Scope) -> bool {
        self.0 & scope.bit() != 0
    }

    /// Parses a comma-separated list of scope names, ignoring unknown names.
    #[must_use]
    pub fn parse(list: &str) -> Self {
        list.split(',')
            .filter_map(|name| Scope::parse(name.trim()))
            .fold(Self::empty(), |set, s| set.with(s))
    }
}

/// A resolved authenticated principal with its granted scopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSubject {
    /// Stable name of the principal; stamped into created records.
    pub subject: String,
    /// Scopes granted to the principal.
    pub scopes: ScopeSet,
}

impl AuthSubject {
    /// Creates a subject with the given granted scopes.
    pub fn new(subject: impl Into<String>, scopes: ScopeSet) -> Self {
        Self {
            subject: subject.into(),
            scopes,
        }
    }

    /// Checks that `scope` is granted.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Unauthorized`] when the scope is missing.
    pub fn require(&self, scope: Scope) -> CoreResult<()> {
        if self.scopes.contains(scope) {
            Ok(())
        } else {
            Err(CoreError::Unauthorized { scope })
        }
    }
}

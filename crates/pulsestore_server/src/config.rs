//! Server configuration.

/// Configuration for the record store boundary.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Collection names the store serves. Requests naming any other
    /// collection get an empty 404, independent of auth outcome.
    pub collections: Vec<String>,
    /// Secret key for signed-token resolution, when enabled.
    pub auth_secret: Option<Vec<u8>>,
}

impl ServerConfig {
    /// Creates a configuration serving the given collections.
    pub fn new(collections: Vec<String>) -> Self {
        Self {
            collections,
            auth_secret: None,
        }
    }

    /// Adds a served collection.
    #[must_use]
    pub fn with_collection(mut self, name: impl Into<String>) -> Self {
        self.collections.push(name.into());
        self
    }

    /// Enables signed-token auth with the given secret.
    #[must_use]
    pub fn with_auth_secret(mut self, secret: Vec<u8>) -> Self {
        self.auth_secret = Some(secret);
        self
    }

    /// Returns `true` when `name` is a served collection.
    #[must_use]
    pub fn knows_collection(&self, name: &str) -> bool {
        self.collections.iter().any(|c| c == name)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(vec!["devicestatus".to_string()])
    }
}

//! VecAdmin Core - Domain models, configuration, and shared types
//!
//! This crate defines the abstractions shared by the VecAdmin clients,
//! API server and CLI:
//! - Connection details for a tenant/database scoped vector store
//! - Wire models for databases, collections, documents and query results
//! - The common error taxonomy
//! - Configuration management
//!
//! Author: hephaex@gmail.com

pub mod config;
pub mod models;

pub use config::{
    AppConfig, ConfigError, EmbeddingConfig, LoggingConfig, ServerConfig, VectorDbConfig,
};
pub use models::{
    CollectionInfo, DatabaseInfo, Document, DocumentBatch, GetResult, Metadata, QueryResult,
    SearchRow,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Error taxonomy for VecAdmin operations
///
/// `Remote`, `NotFound` and `Decode` are the outcomes of talking to the
/// vector store or the embedding service. The remaining variants cover
/// failures that happen before a response exists.
#[derive(Error, Debug)]
pub enum VecAdminError {
    /// The remote service answered with a status >= 400
    #[error("Remote error {status} from {url}: {message}")]
    Remote {
        url: String,
        status: u16,
        message: String,
    },

    /// A collection name did not resolve to an id
    #[error("Collection '{name}' not found (available: [{}])", .available.join(", "))]
    NotFound { name: String, available: Vec<String> },

    /// A successful response carried a body we could not parse
    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    /// The request never produced a response
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl VecAdminError {
    /// Build a `Remote` error
    pub fn remote(url: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Remote {
            url: url.into(),
            status,
            message: message.into(),
        }
    }

    /// Build a `Decode` error
    pub fn decode(url: impl Into<String>, message: impl ToString) -> Self {
        Self::Decode {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Request URL attached to the error, when there is one
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Remote { url, .. } | Self::Decode { url, .. } | Self::Transport { url, .. } => {
                Some(url)
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, VecAdminError>;

// ============================================================================
// Connection
// ============================================================================

/// Everything needed to address one database on a vector store server
///
/// A connection is created when an operator connects and dropped on
/// disconnect. Tenant and database are only checked against the server
/// at connect time.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Connection {
    /// Server base address, e.g. `http://localhost:8000`
    pub server_url: String,

    /// Optional bearer credential
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Tenant identifier
    pub tenant: String,

    /// Database identifier
    pub database: String,
}

impl Connection {
    /// Create a connection without a credential
    pub fn new(
        server_url: impl Into<String>,
        tenant: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            server_url: server_url.into(),
            api_key: None,
            tenant: tenant.into(),
            database: database.into(),
        }
    }

    /// Attach a bearer credential; blank keys are ignored
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.trim().is_empty());
        self
    }

    /// Server address without trailing slashes
    pub fn base_url(&self) -> &str {
        self.server_url.trim_end_matches('/')
    }

    /// Same connection pointed at another database of the tenant
    pub fn for_database(&self, database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..self.clone()
        }
    }

    /// Connection built from the configured defaults
    pub fn from_config(config: &VectorDbConfig) -> Self {
        Self::new(&config.url, &config.tenant, &config.database).with_api_key(config.api_key.clone())
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("server_url", &self.server_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("tenant", &self.tenant)
            .field("database", &self.database)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trims_trailing_slash() {
        let conn = Connection::new("http://localhost:8000//", "t", "d");
        assert_eq!(conn.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_blank_api_key_is_dropped() {
        let conn = Connection::new("http://x", "t", "d").with_api_key(Some("  ".to_string()));
        assert!(conn.api_key.is_none());

        let conn = Connection::new("http://x", "t", "d").with_api_key(Some("secret".to_string()));
        assert_eq!(conn.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let conn = Connection::new("http://x", "t", "d").with_api_key(Some("secret".to_string()));
        let rendered = format!("{conn:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_for_database_keeps_credential() {
        let conn = Connection::new("http://x", "t", "d").with_api_key(Some("k".to_string()));
        let other = conn.for_database("other");
        assert_eq!(other.database, "other");
        assert_eq!(other.tenant, "t");
        assert_eq!(other.api_key.as_deref(), Some("k"));
    }

    #[test]
    fn test_not_found_lists_available_names() {
        let err = VecAdminError::NotFound {
            name: "missing".to_string(),
            available: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Collection 'missing' not found (available: [a, b])"
        );
        assert!(err.url().is_none());
    }

    #[test]
    fn test_remote_error_keeps_url() {
        let err = VecAdminError::remote("http://x/api/v2/foo", 404, "nope");
        assert_eq!(err.url(), Some("http://x/api/v2/foo"));
        assert!(err.to_string().contains("http://x/api/v2/foo"));
    }
}

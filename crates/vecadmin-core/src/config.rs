//! VecAdmin Configuration Management
//!
//! Handles configuration from environment variables and TOML files
//! with sensible defaults for a local development server.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// API server configuration
    pub server: ServerConfig,

    /// Default vector store connection
    pub vector_db: VectorDbConfig,

    /// Embedding service configuration
    pub embedding: EmbeddingConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    ///
    /// `from_env` is this with `std::env::var`; tests pass a map.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Server
        if let Some(host) = lookup("API_HOST") {
            config.server.host = host;
        }
        if let Some(port) = lookup("API_PORT") {
            config.server.port = parse_value("API_PORT", port)?;
        }
        // CORS origins (comma-separated)
        if let Some(origins) = lookup("CORS_ORIGINS") {
            config.server.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Vector store
        if let Some(url) = lookup("VECTOR_DB_URL") {
            config.vector_db.url = url;
        }
        if let Some(key) = lookup("VECTOR_DB_API_KEY") {
            config.vector_db.api_key = Some(key);
        }
        if let Some(tenant) = lookup("VECTOR_DB_TENANT") {
            config.vector_db.tenant = tenant;
        }
        if let Some(database) = lookup("VECTOR_DB_DATABASE") {
            config.vector_db.database = database;
        }
        if let Some(secs) = lookup("VECTOR_DB_HEALTH_TIMEOUT_SECS") {
            config.vector_db.health_timeout_secs =
                parse_value("VECTOR_DB_HEALTH_TIMEOUT_SECS", secs)?;
        }

        // Embedding
        if let Some(key) = lookup("OPENAI_API_KEY") {
            config.embedding.api_key = Some(key);
        }
        if let Some(url) = lookup("EMBEDDING_BASE_URL") {
            config.embedding.base_url = url;
        }
        if let Some(model) = lookup("EMBEDDING_MODEL") {
            config.embedding.model = model;
        }

        // Logging
        if let Some(level) = lookup("LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(json) = lookup("LOG_JSON") {
            config.logging.json_format = parse_value("LOG_JSON", json)?;
        }

        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(self) -> Result<Self, ConfigError> {
        let env_config = Self::from_env()?;
        Ok(self.merge(env_config))
    }

    /// Overlay values from `other` that differ from the defaults
    fn merge(mut self, other: Self) -> Self {
        let server_defaults = ServerConfig::default();
        if other.server.host != server_defaults.host {
            self.server.host = other.server.host;
        }
        if other.server.port != server_defaults.port {
            self.server.port = other.server.port;
        }
        if !other.server.cors_origins.is_empty() {
            self.server.cors_origins = other.server.cors_origins;
        }

        let db_defaults = VectorDbConfig::default();
        if other.vector_db.url != db_defaults.url {
            self.vector_db.url = other.vector_db.url;
        }
        if other.vector_db.tenant != db_defaults.tenant {
            self.vector_db.tenant = other.vector_db.tenant;
        }
        if other.vector_db.database != db_defaults.database {
            self.vector_db.database = other.vector_db.database;
        }
        if other.vector_db.health_timeout_secs != db_defaults.health_timeout_secs {
            self.vector_db.health_timeout_secs = other.vector_db.health_timeout_secs;
        }

        // Always use env for sensitive values
        if other.vector_db.api_key.is_some() {
            self.vector_db.api_key = other.vector_db.api_key;
        }
        if other.embedding.api_key.is_some() {
            self.embedding.api_key = other.embedding.api_key;
        }

        let embedding_defaults = EmbeddingConfig::default();
        if other.embedding.base_url != embedding_defaults.base_url {
            self.embedding.base_url = other.embedding.base_url;
        }
        if other.embedding.model != embedding_defaults.model {
            self.embedding.model = other.embedding.model;
        }

        let logging_defaults = LoggingConfig::default();
        if other.logging.level != logging_defaults.level {
            self.logging.level = other.logging.level;
        }
        if other.logging.json_format != logging_defaults.json_format {
            self.logging.json_format = other.logging.json_format;
        }

        self
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Allowed origins for CORS
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            // Empty by default - set via CORS_ORIGINS env var
            cors_origins: vec![],
        }
    }
}

/// Default vector store connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorDbConfig {
    /// Server base address
    pub url: String,

    /// Bearer credential
    pub api_key: Option<String>,

    /// Tenant identifier
    pub tenant: String,

    /// Database identifier
    pub database: String,

    /// Timeout for the health probe in seconds
    pub health_timeout_secs: u64,
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000".to_string(),
            api_key: None,
            tenant: "default_tenant".to_string(),
            database: "default_database".to_string(),
            health_timeout_secs: 5,
        }
    }
}

/// Embedding service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// API key for the embedding service
    pub api_key: Option<String>,

    /// API base URL (OpenAI or a compatible service)
    pub base_url: String,

    /// Default embedding model
    pub model: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "text-embedding-3-small".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

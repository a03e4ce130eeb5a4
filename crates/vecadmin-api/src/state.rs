//! Application state management
//!
//! Author: hephaex@gmail.com

use crate::error::AppError;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;
use vecadmin_core::config::AppConfig;
use vecadmin_core::Connection;
use vecadmin_vector::{EmbeddingClient, OpenAiEmbedding, VectorStoreClient};

/// One operator's connection to a vector store
///
/// Owns its client, so the collection id cache is never shared between
/// sessions.
pub struct Session {
    pub id: Uuid,
    pub client: VectorStoreClient,
    pub connected_at: DateTime<Utc>,
}

impl Session {
    pub fn connection(&self) -> &Connection {
        self.client.connection()
    }
}

/// Sessions are locked for the whole of a request, so actions on the same
/// session never overlap.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Server start time
    pub start_time: Instant,
    /// Request counter
    pub request_count: AtomicU64,
    /// Active sessions by id
    sessions: RwLock<HashMap<Uuid, SessionHandle>>,
    /// Embedding client, absent when no API key is configured
    embedder: Option<Arc<dyn EmbeddingClient>>,
}

impl AppState {
    /// Create new application state with config
    pub fn new(config: AppConfig) -> Self {
        let embedder = match OpenAiEmbedding::from_config(&config.embedding) {
            Ok(client) => Some(Arc::new(client) as Arc<dyn EmbeddingClient>),
            Err(e) => {
                tracing::warn!("Embedding client disabled: {}", e);
                None
            }
        };

        Self {
            config,
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
            sessions: RwLock::new(HashMap::new()),
            embedder,
        }
    }

    /// Replace the embedding client
    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingClient>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Increment request counter
    pub fn increment_requests(&self) -> u64 {
        self.request_count.fetch_add(1, Ordering::SeqCst)
    }

    /// Get total request count
    pub fn get_request_count(&self) -> u64 {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Timeout for the vector store health probe
    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.config.vector_db.health_timeout_secs)
    }

    /// Build a client for `connection` with the configured probe timeout
    pub fn client_for(&self, connection: Connection) -> VectorStoreClient {
        VectorStoreClient::new(connection).with_health_timeout(self.health_timeout())
    }

    /// Register a new session around `client`
    pub async fn open_session(&self, client: VectorStoreClient) -> SessionHandle {
        let id = Uuid::new_v4();
        tracing::info!(
            session = %id,
            server = client.connection().base_url(),
            tenant = %client.connection().tenant,
            database = %client.connection().database,
            "Session opened"
        );

        let session = Arc::new(Mutex::new(Session {
            id,
            client,
            connected_at: Utc::now(),
        }));
        self.sessions.write().await.insert(id, session.clone());
        session
    }

    /// Look up a session
    pub async fn session(&self, id: &Uuid) -> Option<SessionHandle> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Drop a session; returns whether it existed
    pub async fn close_session(&self, id: &Uuid) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            tracing::info!(session = %id, "Session closed");
        }
        removed
    }

    /// Number of active sessions
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether text operations are available
    pub fn has_embedder(&self) -> bool {
        self.embedder.is_some()
    }

    /// The embedding client, or an error when none is configured
    pub fn embedder(&self) -> Result<Arc<dyn EmbeddingClient>, AppError> {
        self.embedder.clone().ok_or_else(|| {
            AppError::Internal("Embedding API key not configured (set OPENAI_API_KEY)".to_string())
        })
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_session_registry() {
        let state = AppState::default();
        let client = VectorStoreClient::new(Connection::new("http://localhost:8000", "t", "d"));

        let session = state.open_session(client).await;
        let id = session.lock().await.id;
        assert_eq!(state.session_count().await, 1);
        assert!(state.session(&id).await.is_some());

        assert!(state.close_session(&id).await);
        assert!(!state.close_session(&id).await);
        assert!(state.session(&id).await.is_none());
    }

    #[test]
    fn test_embedder_missing_without_key() {
        let state = AppState::default();
        assert!(!state.has_embedder());
        assert!(state.embedder().is_err());
    }

    #[test]
    fn test_health_timeout_from_config() {
        let mut config = AppConfig::default();
        config.vector_db.health_timeout_secs = 2;
        let state = AppState::new(config);
        assert_eq!(state.health_timeout(), Duration::from_secs(2));
    }
}

//! Embedding client for generating vector representations
//!
//! Wraps a single OpenAI-compatible `/embeddings` endpoint. One text per
//! request; no batching, retries or rate-limit handling.
//!
//! Author: hephaex@gmail.com

use crate::http::{decode, read_body, transport_error};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use vecadmin_core::{EmbeddingConfig, Result, VecAdminError};

// ============================================================================
// Embedding Trait
// ============================================================================

/// Trait for embedding generation
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Generate the embedding of `text`, with `model` or the default model
    async fn generate_embedding(&self, text: &str, model: Option<&str>) -> Result<Vec<f32>>;

    /// Model used when none is given
    fn default_model(&self) -> &str;

    /// Generate an embedding with the default model
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.generate_embedding(text, None).await
    }
}

// ============================================================================
// OpenAI Embedding Client
// ============================================================================

/// OpenAI embedding API client
pub struct OpenAiEmbedding {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Human-readable message of an error body: `error.message` when the body
/// is an error envelope, the raw body otherwise
fn error_message(body: String) -> String {
    match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => envelope.error.message,
        Err(_) => body,
    }
}

impl OpenAiEmbedding {
    /// Create a new OpenAI embedding client
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: EmbeddingConfig::default().base_url,
            model: model.into(),
        }
    }

    /// Create from config
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_ref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| VecAdminError::ConfigError("Embedding API key required".to_string()))?;

        Ok(Self::new(api_key.clone(), config.model.clone()).with_base_url(&config.base_url))
    }

    /// Set custom base URL (for compatible APIs)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/embeddings", self.base_url)
    }
}

#[async_trait]
impl EmbeddingClient for OpenAiEmbedding {
    async fn generate_embedding(&self, text: &str, model: Option<&str>) -> Result<Vec<f32>> {
        let url = self.endpoint();
        let request = EmbeddingRequest {
            input: text,
            model: model.unwrap_or(&self.model),
        };
        debug!(url = %url, model = request.model, "embedding request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;

        let body = read_body(&url, response, error_message).await?;
        let result: EmbeddingResponse = decode(&url, &body)?;

        result
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| VecAdminError::decode(&url, "No embedding returned"))
    }

    fn default_model(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Tests
// ============================================================================

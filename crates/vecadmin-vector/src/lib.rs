//! VecAdmin Vector - Vector store and embedding clients
//!
//! Thin HTTP clients for the two remote services VecAdmin talks to:
//! - [`VectorStoreClient`]: tenant/database scoped REST API for databases,
//!   collections and documents
//! - [`EmbeddingClient`]: text -> vector generation ([`OpenAiEmbedding`])
//!
//! Neither client retries, batches or caches beyond the per-client
//! collection name -> id mapping ([`CollectionIdCache`]).

pub mod cache;
pub mod client;
pub mod embedding;
mod http;

#[cfg(feature = "test-utils")]
pub mod testing;

pub use cache::CollectionIdCache;
pub use client::VectorStoreClient;
pub use embedding::{EmbeddingClient, OpenAiEmbedding};

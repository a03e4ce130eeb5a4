//! Vector store REST client
//!
//! Translates typed operations into calls against the tenant/database
//! scoped resource tree:
//!
//! ```text
//! {base}/api/v2/healthcheck
//! {base}/api/v2/tenants/{tenant}/databases[/{name}]
//! {base}/api/v2/tenants/{tenant}/databases/{database}/collections[/{id}[/{action}]]
//! ```
//!
//! Author: hephaex@gmail.com

use crate::cache::CollectionIdCache;
use crate::http::{decode, read_body, transport_error};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use vecadmin_core::{
    CollectionInfo, Connection, DatabaseInfo, DocumentBatch, GetResult, Metadata, QueryResult,
    Result, VecAdminError,
};

/// Default bound for the health probe
pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

const QUERY_INCLUDE: [&str; 3] = ["documents", "metadatas", "distances"];
const GET_INCLUDE: [&str; 2] = ["documents", "metadatas"];

#[derive(Debug, Serialize)]
struct CreateDatabaseRequest<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateCollectionRequest<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a Metadata>,
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query_embeddings: &'a [Vec<f32>],
    n_results: usize,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    filter: Option<&'a Metadata>,
    include: [&'static str; 3],
}

#[derive(Debug, Serialize)]
struct GetRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    ids: Option<&'a [String]>,
    limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<usize>,
    include: [&'static str; 2],
}

#[derive(Debug, Serialize)]
struct DeleteRequest<'a> {
    ids: &'a [String],
}

/// Client for one tenant/database on a vector store server
///
/// The connection is fixed for the client's lifetime; switching database
/// means building a new client (and with it a fresh id cache).
pub struct VectorStoreClient {
    http: Client,
    connection: Connection,
    health_timeout: Duration,
    collections: CollectionIdCache,
}

impl VectorStoreClient {
    /// Create a client for the given connection
    pub fn new(connection: Connection) -> Self {
        Self {
            http: Client::new(),
            connection,
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
            collections: CollectionIdCache::new(),
        }
    }

    /// Set the timeout used by [`health_check`](Self::health_check)
    pub fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Collection ids resolved so far
    pub fn cache(&self) -> &CollectionIdCache {
        &self.collections
    }

    // ------------------------------------------------------------------
    // Health
    // ------------------------------------------------------------------

    /// Probe the server's readiness flag
    ///
    /// This is the only call with a timeout.
    pub async fn health_check(&self) -> Result<bool> {
        let url = self.endpoint(&["healthcheck"])?;
        let builder = self
            .request(Method::GET, &url)
            .timeout(self.health_timeout);
        let body = self.send(builder, &url).await?;
        let status: serde_json::Value = decode(url.as_str(), &body)?;

        Ok(status
            .get("is_executor_ready")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false))
    }

    // ------------------------------------------------------------------
    // Databases
    // ------------------------------------------------------------------

    /// List the databases of `tenant`
    pub async fn list_databases(&self, tenant: &str) -> Result<Vec<DatabaseInfo>> {
        let url = self.endpoint(&["tenants", tenant, "databases"])?;
        self.get_json(url).await
    }

    /// Create a database under the current tenant
    pub async fn create_database(&self, name: &str) -> Result<()> {
        let url = self.endpoint(&["tenants", self.connection.tenant.as_str(), "databases"])?;
        self.post(url, &CreateDatabaseRequest { name }).await
    }

    /// Delete a database of the current tenant
    pub async fn delete_database(&self, name: &str) -> Result<()> {
        let tenant = self.connection.tenant.as_str();
        let url = self.endpoint(&["tenants", tenant, "databases", name])?;
        self.delete(url).await
    }

    // ------------------------------------------------------------------
    // Collections
    // ------------------------------------------------------------------

    /// List the collections of the current database in server order
    pub async fn list_collections(&self) -> Result<Vec<CollectionInfo>> {
        let url = self.collections_endpoint(&[])?;
        self.get_json(url).await
    }

    /// Create a collection; empty metadata is left out of the payload
    pub async fn create_collection(
        &mut self,
        name: &str,
        metadata: Option<&Metadata>,
    ) -> Result<CollectionInfo> {
        let url = self.collections_endpoint(&[])?;
        let request = CreateCollectionRequest {
            name,
            metadata: metadata.filter(|m| !m.is_empty()),
        };

        let collection: CollectionInfo = self.post_json(url, &request).await?;
        self.collections.insert(name, collection.id.as_str());
        Ok(collection)
    }

    /// Delete a collection by name
    ///
    /// The name is evicted from the id cache whether or not the server
    /// call succeeds.
    pub async fn delete_collection(&mut self, name: &str) -> Result<()> {
        let id = self.collection_id(name).await?;
        let url = self.collections_endpoint(&[id.as_str()])?;
        let result = self.delete(url).await;
        self.collections.invalidate(name);
        result
    }

    /// Fetch the full record of a collection
    pub async fn get_collection(&mut self, name: &str) -> Result<CollectionInfo> {
        let id = self.collection_id(name).await?;
        let url = self.collections_endpoint(&[id.as_str()])?;
        self.get_json(url).await
    }

    /// Resolve a collection name to its id, using the cache when possible
    pub async fn collection_id(&mut self, name: &str) -> Result<String> {
        if let Some(id) = self.collections.get(name) {
            debug!(collection = name, "collection id cache hit");
            return Ok(id.to_string());
        }
        self.refresh_collection_id(name).await
    }

    /// Resolve a collection name against a fresh listing
    pub async fn refresh_collection_id(&mut self, name: &str) -> Result<String> {
        debug!(collection = name, "resolving collection id");
        let collections = self.list_collections().await?;

        match collections.iter().find(|c| c.name == name) {
            Some(collection) => {
                self.collections.insert(name, collection.id.as_str());
                Ok(collection.id.clone())
            }
            None => Err(VecAdminError::NotFound {
                name: name.to_string(),
                available: collections.into_iter().map(|c| c.name).collect(),
            }),
        }
    }

    /// Re-list collections and rebuild the whole id cache
    pub async fn refresh_collections(&mut self) -> Result<Vec<CollectionInfo>> {
        let collections = self.list_collections().await?;
        self.collections.replace_all(
            collections
                .iter()
                .map(|c| (c.name.as_str(), c.id.as_str())),
        );
        Ok(collections)
    }

    /// Drop the cached id of `name`
    pub fn invalidate_collection(&mut self, name: &str) -> Option<String> {
        self.collections.invalidate(name)
    }

    // ------------------------------------------------------------------
    // Documents
    // ------------------------------------------------------------------

    /// Append documents to a collection
    pub async fn add_documents(&mut self, collection: &str, batch: &DocumentBatch) -> Result<()> {
        let url = self.collection_action(collection, "add").await?;
        self.post(url, batch).await
    }

    /// Update documents by id
    pub async fn update_documents(
        &mut self,
        collection: &str,
        batch: &DocumentBatch,
    ) -> Result<()> {
        let url = self.collection_action(collection, "update").await?;
        self.post(url, batch).await
    }

    /// Nearest-neighbour query, one result list per query embedding
    ///
    /// Hits are returned in server order; nothing is re-sorted here.
    pub async fn query_collection(
        &mut self,
        collection: &str,
        query_embeddings: &[Vec<f32>],
        n_results: usize,
        filter: Option<&Metadata>,
    ) -> Result<QueryResult> {
        let url = self.collection_action(collection, "query").await?;
        let request = QueryRequest {
            query_embeddings,
            n_results,
            filter: filter.filter(|f| !f.is_empty()),
            include: QUERY_INCLUDE,
        };
        self.post_json(url, &request).await
    }

    /// Page through documents
    ///
    /// Empty `ids` means "all documents". A zero `offset` is not sent.
    pub async fn get_documents(
        &mut self,
        collection: &str,
        ids: &[String],
        limit: usize,
        offset: usize,
    ) -> Result<GetResult> {
        let url = self.collection_action(collection, "get").await?;
        let request = GetRequest {
            ids: (!ids.is_empty()).then_some(ids),
            limit,
            offset: (offset > 0).then_some(offset),
            include: GET_INCLUDE,
        };
        self.post_json(url, &request).await
    }

    /// Number of documents in a collection
    pub async fn count_documents(&mut self, collection: &str) -> Result<u64> {
        let url = self.collection_action(collection, "count").await?;
        self.get_json(url).await
    }

    /// Delete documents by id
    pub async fn delete_documents(&mut self, collection: &str, ids: &[String]) -> Result<()> {
        let url = self.collection_action(collection, "delete").await?;
        self.post(url, &DeleteRequest { ids }).await
    }

    // ------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let base = self.connection.base_url();
        let mut url = Url::parse(base)
            .map_err(|e| VecAdminError::ConfigError(format!("Invalid server URL '{base}': {e}")))?;

        url.path_segments_mut()
            .map_err(|_| {
                VecAdminError::ConfigError(format!("Server URL '{base}' cannot be a base"))
            })?
            .pop_if_empty()
            .extend(["api", "v2"])
            .extend(segments);

        Ok(url)
    }

    fn collections_endpoint(&self, rest: &[&str]) -> Result<Url> {
        let mut segments = vec![
            "tenants",
            self.connection.tenant.as_str(),
            "databases",
            self.connection.database.as_str(),
            "collections",
        ];
        segments.extend_from_slice(rest);
        self.endpoint(&segments)
    }

    async fn collection_action(&mut self, collection: &str, action: &str) -> Result<Url> {
        let id = self.collection_id(collection).await?;
        self.collections_endpoint(&[id.as_str(), action])
    }

    fn request(&self, method: Method, url: &Url) -> RequestBuilder {
        debug!(%method, %url, "vector store request");
        let builder = self.http.request(method, url.clone());
        match &self.connection.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, url: &Url) -> Result<String> {
        let url = url.as_str();
        let response = builder.send().await.map_err(|e| transport_error(url, e))?;
        read_body(url, response, |body| body).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let body = self.send(self.request(Method::GET, &url), &url).await?;
        decode(url.as_str(), &body)
    }

    async fn post_json<B, T>(&self, url: Url, payload: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(Method::POST, &url).json(payload);
        let body = self.send(builder, &url).await?;
        decode(url.as_str(), &body)
    }

    async fn post<B: Serialize + ?Sized>(&self, url: Url, payload: &B) -> Result<()> {
        let builder = self.request(Method::POST, &url).json(payload);
        self.send(builder, &url).await.map(|_| ())
    }

    async fn delete(&self, url: Url) -> Result<()> {
        let builder = self.request(Method::DELETE, &url);
        self.send(builder, &url).await.map(|_| ())
    }
}

//! Wire models exchanged with the vector store
//!
//! These mirror the JSON shapes of the tenant/database scoped REST API.
//! Nothing here is persisted locally; values are staged before a request
//! and unpacked after a response.
//!
//! Author: hephaex@gmail.com

use serde::{Deserialize, Serialize};

/// Arbitrary JSON object attached to collections and documents
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A database inside a tenant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseInfo {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
}

/// A collection record as listed or fetched from the server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectionInfo {
    /// Opaque server-side id
    pub id: String,

    /// Unique name within the database
    pub name: String,

    #[serde(default)]
    pub metadata: Option<Metadata>,
}

/// A stored document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: String,

    #[serde(default)]
    pub text: Option<String>,

    #[serde(default)]
    pub metadata: Option<Metadata>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

/// One row of a similarity query
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchRow {
    pub id: String,
    pub text: Option<String>,
    pub metadata: Option<Metadata>,

    /// Lower is more similar
    pub distance: Option<f32>,
}

/// Parallel arrays describing documents to add or update
///
/// The four arrays are sent as-is; their lengths are checked by the
/// server, not here.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct DocumentBatch {
    pub ids: Vec<String>,
    pub embeddings: Vec<Vec<f32>>,

    #[serde(rename = "documents")]
    pub texts: Vec<String>,

    pub metadatas: Vec<Option<Metadata>>,
}

impl DocumentBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage one document. Empty metadata is sent as `null`.
    pub fn push(
        &mut self,
        id: impl Into<String>,
        text: impl Into<String>,
        embedding: Vec<f32>,
        metadata: Option<Metadata>,
    ) {
        self.ids.push(id.into());
        self.texts.push(text.into());
        self.embeddings.push(embedding);
        self.metadatas.push(metadata.filter(|m| !m.is_empty()));
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Response of a `get` call: parallel arrays, one entry per document
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GetResult {
    pub ids: Vec<String>,

    #[serde(default)]
    pub documents: Option<Vec<Option<String>>>,

    #[serde(default)]
    pub metadatas: Option<Vec<Option<Metadata>>>,

    #[serde(default)]
    pub embeddings: Option<Vec<Option<Vec<f32>>>>,
}

impl GetResult {
    /// Zip the parallel arrays into document records
    pub fn into_documents(self) -> Vec<Document> {
        let mut documents = self.documents.unwrap_or_default().into_iter();
        let mut metadatas = self.metadatas.unwrap_or_default().into_iter();
        let mut embeddings = self.embeddings.unwrap_or_default().into_iter();

        self.ids
            .into_iter()
            .map(|id| Document {
                id,
                text: documents.next().flatten(),
                metadata: metadatas.next().flatten(),
                embedding: embeddings.next().flatten(),
            })
            .collect()
    }
}

/// Response of a `query` call
///
/// The outer dimension is the query embedding, the inner one the ranked
/// hits for that query in server order (closest first).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QueryResult {
    pub ids: Vec<Vec<String>>,

    #[serde(default)]
    pub documents: Option<Vec<Vec<Option<String>>>>,

    #[serde(default)]
    pub metadatas: Option<Vec<Vec<Option<Metadata>>>>,

    #[serde(default)]
    pub distances: Option<Vec<Vec<Option<f32>>>>,
}

impl QueryResult {
    /// Number of query embeddings answered
    pub fn query_count(&self) -> usize {
        self.ids.len()
    }

    /// Rows for one query embedding, in the order the server returned them
    pub fn rows(&self, query_index: usize) -> Vec<SearchRow> {
        let Some(ids) = self.ids.get(query_index) else {
            return Vec::new();
        };

        let documents = self.documents.as_ref().and_then(|d| d.get(query_index));
        let metadatas = self.metadatas.as_ref().and_then(|m| m.get(query_index));
        let distances = self.distances.as_ref().and_then(|d| d.get(query_index));

        ids.iter()
            .enumerate()
            .map(|(i, id)| SearchRow {
                id: id.clone(),
                text: documents.and_then(|d| d.get(i).cloned().flatten()),
                metadata: metadatas.and_then(|m| m.get(i).cloned().flatten()),
                distance: distances.and_then(|d| d.get(i).copied().flatten()),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_batch_push_drops_empty_metadata() {
        let mut batch = DocumentBatch::new();
        batch.push("a", "alpha", vec![0.1], Some(Metadata::new()));
        let mut meta = Metadata::new();
        meta.insert("k".to_string(), json!("v"));
        batch.push("b", "beta", vec![0.2], Some(meta));

        assert_eq!(batch.len(), 2);
        assert!(batch.metadatas[0].is_none());
        assert!(batch.metadatas[1].is_some());

        let payload = serde_json::to_value(&batch).unwrap();
        assert_eq!(payload["documents"], json!(["alpha", "beta"]));
        assert_eq!(payload["metadatas"][0], json!(null));
    }

    #[test]
    fn test_get_result_handles_null_entries() {
        let result: GetResult = serde_json::from_value(json!({
            "ids": ["a", "b"],
            "documents": ["first", null],
            "metadatas": [null, {"lang": "en"}]
        }))
        .unwrap();

        let docs = result.into_documents();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].text.as_deref(), Some("first"));
        assert!(docs[0].metadata.is_none());
        assert!(docs[1].text.is_none());
        assert_eq!(docs[1].metadata.as_ref().unwrap()["lang"], json!("en"));
        assert!(docs[1].embedding.is_none());
    }

    #[test]
    fn test_query_rows_keep_server_order() {
        let result: QueryResult = serde_json::from_value(json!({
            "ids": [["x", "y", "z"]],
            "documents": [["dx", "dy", null]],
            "metadatas": [[null, null, null]],
            "distances": [[0.1, 0.4, 0.2]]
        }))
        .unwrap();

        let rows = result.rows(0);
        let ids: Vec<_> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["x", "y", "z"]);
        assert_eq!(rows[2].distance, Some(0.2));
        assert!(rows[2].text.is_none());
        assert!(result.rows(1).is_empty());
    }

    #[test]
    fn test_query_rows_without_optional_arrays() {
        let result: QueryResult = serde_json::from_value(json!({ "ids": [["only"]] })).unwrap();
        let rows = result.rows(0);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].distance.is_none());
    }
}

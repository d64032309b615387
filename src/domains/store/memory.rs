//! In-memory document store.
//!
//! Holds a collection in memory, optionally seeded from a JSON file
//! containing an array of objects. Suitable for local development, demos,
//! and tests; every read compiles the filter and scans the collection.

use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::error::{StoreError, StoreResult};
use super::filter::Filter;
use super::{Document, DocumentStore, JsonObject, normalize_id};
use crate::core::config::StoreConfig;

/// A document collection held in memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    documents: RwLock<Vec<Document>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with the given documents.
    pub fn with_documents(documents: impl IntoIterator<Item = Document>) -> Self {
        let documents = documents
            .into_iter()
            .map(|mut document| {
                normalize_id(&mut document);
                document
            })
            .collect();

        Self {
            documents: RwLock::new(documents),
        }
    }

    /// Create a store from a JSON value that must be an array of objects.
    pub fn from_json(value: Value) -> StoreResult<Self> {
        let Value::Array(items) = value else {
            return Err(StoreError::malformed("expected a JSON array of documents"));
        };

        let documents = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(document) => Ok(document),
                _ => Err(StoreError::malformed(format!(
                    "document at index {index} is not an object"
                ))),
            })
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(Self::with_documents(documents))
    }

    /// Load a store from a JSON file.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| StoreError::load(path, e))?;
        let store = Self::from_json(serde_json::from_str(&raw)?)?;
        info!("Loaded document store from {:?}", path);
        Ok(store)
    }

    /// Build the store described by the configuration.
    pub fn from_config(config: &StoreConfig) -> StoreResult<Self> {
        match &config.path {
            Some(path) => Self::load(path),
            None => {
                warn!("MCP_STORE_PATH not set - starting with an empty document store");
                Ok(Self::new())
            }
        }
    }

    /// Append a document to the collection.
    pub async fn insert(&self, mut document: Document) {
        normalize_id(&mut document);
        self.documents.write().await.push(document);
    }

    /// Number of documents held.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn query(
        &self,
        filter: &JsonObject,
        limit: u32,
        skip: u64,
    ) -> StoreResult<Vec<Document>> {
        let compiled = Filter::compile(filter)?;
        let skip = usize::try_from(skip).unwrap_or(usize::MAX);

        let documents = self.documents.read().await;
        let results: Vec<Document> = documents
            .iter()
            .filter(|document| compiled.matches(document))
            .skip(skip)
            .take(limit as usize)
            .cloned()
            .collect();

        debug!(
            results_count = results.len(),
            limit, skip, "Document query completed"
        );
        Ok(results)
    }

    async fn count(&self, filter: &JsonObject) -> StoreResult<u64> {
        let compiled = Filter::compile(filter)?;

        let documents = self.documents.read().await;
        let count = documents
            .iter()
            .filter(|document| compiled.matches(document))
            .count() as u64;

        debug!(count, "Document count completed");
        Ok(count)
    }
}

//! Document search tool definition.
//!
//! Runs a filtered, paginated query against the document store, optionally
//! projects each record down to a set of fields, and reports pagination
//! metadata computed from a separate count query.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, de};
use serde_json::{Value, json};
use tracing::{error, info, instrument};

use crate::domains::store::{Document, DocumentStore, ID_FIELD, JsonObject};
use crate::domains::tools::error::ToolError;
use crate::domains::tools::handlers::{Tool, ToolFailure, ToolOutcome, ToolOutput};

/// Largest page a single search may request.
pub const MAX_LIMIT: i64 = 100;

/// Page size used when `limit` is omitted.
pub const DEFAULT_LIMIT: i64 = 10;

// ============================================================================
// Tool Parameters
// ============================================================================

/// Raw inputs as received, before range validation.
#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    query: JsonObject,

    #[serde(default = "default_limit", deserialize_with = "lax_integer")]
    limit: i64,

    #[serde(default, deserialize_with = "lax_integer")]
    skip: i64,

    #[serde(default)]
    fields: Option<Vec<String>>,
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

/// Accept an integer given as a JSON integer, an integral float (`10.0`) or
/// a numeric string (`"10"`).
fn lax_integer<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() <= MAX_EXACT_FLOAT)
                    .map(|f| f as i64)
            })
            .ok_or_else(|| de::Error::custom(format!("expected an integer, got {n}"))),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| de::Error::custom(format!("expected an integer, got \"{s}\""))),
        other => Err(de::Error::custom(format!(
            "expected an integer, got {other}"
        ))),
    }
}

/// Validated search inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    /// Filter passed through to the store untouched.
    pub query: JsonObject,

    /// Page size, between 1 and 100.
    pub limit: u32,

    /// Number of matches to skip.
    pub skip: u64,

    /// Fields to keep in each record, if any.
    pub fields: Option<Vec<String>>,
}

impl SearchQuery {
    /// Validate raw tool inputs. Out-of-range values are rejected, never
    /// clamped.
    pub fn from_inputs(inputs: &JsonObject) -> Result<Self, ToolError> {
        let params: SearchParams = serde_json::from_value(Value::Object(inputs.clone()))
            .map_err(|e| ToolError::invalid_input(e.to_string()))?;

        if !(1..=MAX_LIMIT).contains(&params.limit) {
            return Err(ToolError::invalid_input(format!(
                "limit must be between 1 and {MAX_LIMIT}, got {}",
                params.limit
            )));
        }

        if params.skip < 0 {
            return Err(ToolError::invalid_input(format!(
                "skip must be greater than or equal to 0, got {}",
                params.skip
            )));
        }

        Ok(Self {
            query: params.query,
            limit: params.limit as u32,
            skip: params.skip as u64,
            fields: params.fields,
        })
    }
}

/// Pagination metadata reported with every successful search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchMetadata {
    pub total_count: u64,
    pub returned_count: usize,
    pub query: JsonObject,
    pub limit: u32,
    pub skip: u64,
    pub has_more: bool,
}

impl SearchMetadata {
    fn new(search: &SearchQuery, total_count: u64, returned_count: usize) -> Self {
        Self {
            total_count,
            returned_count,
            query: search.query.clone(),
            limit: search.limit,
            skip: search.skip,
            has_more: total_count > search.skip + returned_count as u64,
        }
    }

    fn into_metadata(self) -> JsonObject {
        let mut metadata = JsonObject::new();
        metadata.insert("total_count".into(), json!(self.total_count));
        metadata.insert("returned_count".into(), json!(self.returned_count));
        metadata.insert("query".into(), Value::Object(self.query));
        metadata.insert("limit".into(), json!(self.limit));
        metadata.insert("skip".into(), json!(self.skip));
        metadata.insert("has_more".into(), json!(self.has_more));
        metadata
    }
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Document search tool - queries the document store with pagination.
pub struct DocumentSearchTool {
    store: Arc<dyn DocumentStore>,
}

impl DocumentSearchTool {
    /// Tool name as registered in the registry.
    pub const NAME: &'static str = "document_search";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str =
        "Search documents in the document store using query parameters";

    /// Create the tool over the given store.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Run a validated search.
    async fn search(&self, search: &SearchQuery) -> Result<ToolOutput, ToolError> {
        info!(
            query = %serde_json::Value::Object(search.query.clone()),
            limit = search.limit,
            skip = search.skip,
            "Executing document search"
        );

        let mut documents = self
            .store
            .query(&search.query, search.limit, search.skip)
            .await?;

        if let Some(fields) = search.fields.as_deref().filter(|f| !f.is_empty()) {
            documents = documents
                .into_iter()
                .map(|document| project(document, fields))
                .collect();
        }

        let total_count = self.store.count(&search.query).await?;
        let metadata = SearchMetadata::new(search, total_count, documents.len());

        info!(
            returned_count = metadata.returned_count,
            total_count, "Document search completed successfully"
        );

        let data = Value::Array(documents.into_iter().map(Value::Object).collect());
        Ok(ToolOutput::new(data, metadata.into_metadata()))
    }
}

#[async_trait]
impl Tool for DocumentSearchTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        Self::DESCRIPTION
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "object",
                    "description": "Filter document (e.g., {\"name\": \"John\", \"age\": {\"$gt\": 25}})",
                    "default": {}
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of documents to return",
                    "minimum": 1,
                    "maximum": MAX_LIMIT,
                    "default": DEFAULT_LIMIT
                },
                "skip": {
                    "type": "integer",
                    "description": "Number of documents to skip for pagination",
                    "minimum": 0,
                    "default": 0
                },
                "fields": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Specific fields to return (optional)"
                }
            },
            "required": []
        })
    }

    #[instrument(skip_all, fields(tool = "document_search"))]
    async fn execute(&self, inputs: JsonObject) -> ToolOutcome {
        let outcome = match SearchQuery::from_inputs(&inputs) {
            Ok(search) => self.search(&search).await,
            Err(e) => Err(e),
        };

        outcome.map_err(|e| {
            let failure = ToolFailure::new(e).context("Document search failed");
            error!(error = %failure.message, "Document search error");

            let raw_query = inputs.get("query").cloned().unwrap_or_else(|| json!({}));
            failure.with_metadata("query", raw_query)
        })
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Keep only the requested fields that exist, plus the identifier.
fn project(mut document: Document, fields: &[String]) -> Document {
    let mut projected = Document::new();
    for field in fields {
        if let Some(value) = document.remove(field.as_str()) {
            projected.insert(field.clone(), value);
        }
    }
    if let Some(id) = document.remove(ID_FIELD) {
        projected.insert(ID_FIELD.to_string(), id);
    }
    projected
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::store::{InMemoryStore, StoreError, StoreResult};
    use crate::domains::tools::error::ErrorKind;
    use crate::domains::tools::envelope::ExecutionResult;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Wraps a store and counts round trips.
    struct RecordingStore {
        inner: InMemoryStore,
        queries: AtomicUsize,
        counts: AtomicUsize,
    }

    impl RecordingStore {
        fn new(inner: InMemoryStore) -> Self {
            Self {
                inner,
                queries: AtomicUsize::new(0),
                counts: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.queries.load(Ordering::SeqCst) + self.counts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DocumentStore for RecordingStore {
        async fn query(
            &self,
            filter: &JsonObject,
            limit: u32,
            skip: u64,
        ) -> StoreResult<Vec<Document>> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            self.inner.query(filter, limit, skip).await
        }

        async fn count(&self, filter: &JsonObject) -> StoreResult<u64> {
            self.counts.fetch_add(1, Ordering::SeqCst);
            self.inner.count(filter).await
        }
    }

    /// Fails the query, the count, or both.
    struct FailingStore {
        fail_query: bool,
    }

    #[async_trait]
    impl DocumentStore for FailingStore {
        async fn query(
            &self,
            _filter: &JsonObject,
            _limit: u32,
            _skip: u64,
        ) -> StoreResult<Vec<Document>> {
            if self.fail_query {
                Err(StoreError::unavailable("connection refused"))
            } else {
                Ok(vec![object(json!({ "_id": "a" }))])
            }
        }

        async fn count(&self, _filter: &JsonObject) -> StoreResult<u64> {
            Err(StoreError::unavailable("connection reset"))
        }
    }

    fn object(value: Value) -> JsonObject {
        value.as_object().cloned().unwrap()
    }

    fn numbered_store(count: usize) -> Arc<RecordingStore> {
        Arc::new(RecordingStore::new(InMemoryStore::with_documents(
            (0..count).map(|i| object(json!({ "_id": format!("doc-{i}"), "n": i }))),
        )))
    }

    async fn run(tool: &DocumentSearchTool, inputs: Value) -> ExecutionResult {
        tool.execute(object(inputs)).await.into()
    }

    #[test]
    fn test_schema_shape() {
        let tool = DocumentSearchTool::new(numbered_store(0));
        let schema = tool.schema();
        assert_eq!(schema["type"], json!("object"));
        assert_eq!(schema["required"], json!([]));
        assert_eq!(schema["properties"]["limit"]["minimum"], json!(1));
        assert_eq!(schema["properties"]["limit"]["maximum"], json!(100));
        assert_eq!(schema["properties"]["limit"]["default"], json!(10));
        assert_eq!(schema["properties"]["skip"]["minimum"], json!(0));
        assert_eq!(schema["properties"]["query"]["default"], json!({}));
        assert_eq!(schema["properties"]["fields"]["items"]["type"], json!("string"));
        assert_eq!(tool.describe().name, "document_search");
    }

    #[test]
    fn test_defaults_applied() {
        let search = SearchQuery::from_inputs(&JsonObject::new()).unwrap();
        assert_eq!(search.limit, 10);
        assert_eq!(search.skip, 0);
        assert!(search.query.is_empty());
        assert_eq!(search.fields, None);
    }

    #[test]
    fn test_numeric_strings_and_integral_floats_are_coerced() {
        for inputs in [
            json!({ "limit": "10", "skip": "5" }),
            json!({ "limit": 10.0, "skip": 5.0 }),
            json!({ "limit": " 10 ", "skip": 5 }),
        ] {
            let search = SearchQuery::from_inputs(&object(inputs.clone())).unwrap();
            assert_eq!(search.limit, 10, "limit for {inputs}");
            assert_eq!(search.skip, 5, "skip for {inputs}");
        }
    }

    #[tokio::test]
    async fn test_string_limit_runs_search() {
        let tool = DocumentSearchTool::new(numbered_store(25));
        let result = run(&tool, json!({ "limit": "10" })).await;
        assert!(result.success);
        assert_eq!(result.returned_count(), 10);
        assert_eq!(result.metadata["limit"], json!(10));
    }

    #[tokio::test]
    async fn test_out_of_range_inputs_never_reach_store() {
        for inputs in [
            json!({ "limit": 0 }),
            json!({ "limit": 101 }),
            json!({ "skip": -1 }),
            json!({ "limit": "ten" }),
            json!({ "limit": 2.5 }),
            json!({ "limit": "101" }),
            json!({ "skip": "-1" }),
            json!({ "limit": null }),
            json!({ "query": "not an object" }),
            json!({ "fields": "title" }),
        ] {
            let store = numbered_store(5);
            let tool = DocumentSearchTool::new(store.clone());

            let result = run(&tool, inputs.clone()).await;
            assert!(!result.success, "expected failure for {inputs}");
            assert_eq!(result.error_kind, Some(ErrorKind::InvalidInput));
            assert!(result
                .error
                .as_deref()
                .unwrap()
                .starts_with("Document search failed: Invalid input"));
            assert_eq!(store.calls(), 0, "store was called for {inputs}");
        }
    }

    #[tokio::test]
    async fn test_pagination_metadata() {
        let tool = DocumentSearchTool::new(numbered_store(25));

        let first = run(&tool, json!({ "limit": 10, "skip": 0 })).await;
        assert!(first.success);
        assert_eq!(first.error, None);
        assert_eq!(first.metadata["total_count"], json!(25));
        assert_eq!(first.metadata["returned_count"], json!(10));
        assert_eq!(first.metadata["has_more"], json!(true));
        assert_eq!(first.metadata["limit"], json!(10));
        assert_eq!(first.metadata["skip"], json!(0));
        assert_eq!(first.metadata["query"], json!({}));

        let last = run(&tool, json!({ "limit": 10, "skip": 20 })).await;
        assert_eq!(last.metadata["returned_count"], json!(5));
        assert_eq!(last.returned_count(), 5);
        assert_eq!(last.metadata["has_more"], json!(false));
    }

    #[tokio::test]
    async fn test_search_issues_query_then_count() {
        let store = numbered_store(3);
        let tool = DocumentSearchTool::new(store.clone());
        let result = run(&tool, json!({})).await;
        assert!(result.success);
        assert_eq!(store.queries.load(Ordering::SeqCst), 1);
        assert_eq!(store.counts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_field_projection_keeps_identifier() {
        let store = Arc::new(InMemoryStore::with_documents(vec![object(
            json!({ "_id": "x", "a": 1, "b": 2 }),
        )]));
        let tool = DocumentSearchTool::new(store);

        let projected = run(&tool, json!({ "fields": ["a"] })).await;
        assert_eq!(projected.data, Some(json!([{ "_id": "x", "a": 1 }])));

        let missing = run(&tool, json!({ "fields": ["c"] })).await;
        assert_eq!(missing.data, Some(json!([{ "_id": "x" }])));

        let unprojected = run(&tool, json!({ "fields": [] })).await;
        assert_eq!(unprojected.data, Some(json!([{ "_id": "x", "a": 1, "b": 2 }])));
    }

    #[tokio::test]
    async fn test_repeated_searches_are_identical() {
        let tool = DocumentSearchTool::new(numbered_store(12));
        let inputs = json!({ "query": { "n": { "$gte": 3 } }, "limit": 4, "skip": 2 });

        let first = run(&tool, inputs.clone()).await;
        let second = run(&tool, inputs).await;
        assert_eq!(first.data, second.data);
        assert_eq!(first.metadata, second.metadata);
        assert_eq!(first.metadata["total_count"], json!(9));
    }

    #[tokio::test]
    async fn test_store_failure_becomes_failed_result() {
        let tool = DocumentSearchTool::new(Arc::new(FailingStore { fail_query: true }));
        let result = run(&tool, json!({ "query": { "name": "x" } })).await;

        assert!(!result.success);
        assert_eq!(result.data, None);
        assert_eq!(
            result.error.as_deref(),
            Some("Document search failed: Store unavailable: connection refused")
        );
        assert_eq!(result.error_kind, Some(ErrorKind::DownstreamFailure));
        assert_eq!(Value::Object(result.metadata), json!({ "query": { "name": "x" } }));
    }

    #[tokio::test]
    async fn test_count_failure_discards_partial_results() {
        let tool = DocumentSearchTool::new(Arc::new(FailingStore { fail_query: false }));
        let result = run(&tool, json!({})).await;

        assert!(!result.success);
        assert_eq!(result.data, None);
        assert_eq!(result.metadata["query"], json!({}));
        assert!(!result.metadata.contains_key("total_count"));
    }

    #[tokio::test]
    async fn test_malformed_filter_is_downstream_failure() {
        let tool = DocumentSearchTool::new(numbered_store(3));
        let result = run(&tool, json!({ "query": { "$where": "true" } })).await;
        assert_eq!(result.error_kind, Some(ErrorKind::DownstreamFailure));
        assert!(result.error.as_deref().unwrap().contains("Invalid filter"));
    }
}

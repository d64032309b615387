//! HTTP client for the tool server.
//!
//! Wraps the REST tool protocol (`/health`, `/tools`, `/execute`) and turns
//! transport failures into the same envelope shape the server produces, so
//! callers of the search and execution helpers only ever inspect
//! `success`/`error`.

mod error;
pub mod prompt;

use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{error, info, instrument, warn};

pub use error::{ClientError, ClientResult};
pub use prompt::{PROMPT_RESULT_LIMIT, text_search_filter};

use crate::core::config::MCP_VERSION;
use crate::core::transport::{default_host, default_port};
use crate::domains::store::JsonObject;
use crate::domains::tools::definitions::DocumentSearchTool;
use crate::domains::tools::{ExecutionRequest, ExecutionResult, ToolDescriptor, ToolListResponse};

/// Parameters of a document search issued by the client.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: JsonObject,
    pub limit: u32,
    pub skip: u64,
    pub fields: Option<Vec<String>>,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            query: JsonObject::new(),
            limit: 10,
            skip: 0,
            fields: None,
        }
    }
}

impl SearchRequest {
    /// Search with the given filter and default paging.
    pub fn new(query: JsonObject) -> Self {
        Self {
            query,
            ..Default::default()
        }
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    pub fn fields(mut self, fields: Vec<String>) -> Self {
        self.fields = Some(fields);
        self
    }

    fn into_inputs(self) -> JsonObject {
        let mut inputs = JsonObject::new();
        inputs.insert("query".to_string(), Value::Object(self.query));
        inputs.insert("limit".to_string(), json!(self.limit));
        inputs.insert("skip".to_string(), json!(self.skip));
        if let Some(fields) = self.fields.filter(|fields| !fields.is_empty()) {
            inputs.insert("fields".to_string(), json!(fields));
        }
        inputs
    }
}

/// Client for a running tool server.
#[derive(Debug, Clone)]
pub struct McpClient {
    client: Client,
    server_url: String,
}

impl McpClient {
    /// Create a client for the server at `server_url`.
    pub fn new(server_url: impl Into<String>) -> ClientResult<Self> {
        let client = Client::builder()
            .user_agent(format!("MCP-Client/{}", MCP_VERSION))
            .build()?;

        Ok(Self {
            client,
            server_url: server_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Create a client from `MCP_SERVER_URL`, or from `MCP_SERVER_HOST` and
    /// `MCP_SERVER_PORT` when no URL is set.
    pub fn from_env() -> ClientResult<Self> {
        dotenvy::dotenv().ok();

        let server_url = std::env::var("MCP_SERVER_URL").unwrap_or_else(|_| {
            let host = std::env::var("MCP_SERVER_HOST").unwrap_or_else(|_| default_host());
            let port = std::env::var("MCP_SERVER_PORT")
                .ok()
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or_else(default_port);
            format!("http://{}:{}", host, port)
        });

        Self::new(server_url)
    }

    /// Base URL of the server.
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("detail").and_then(Value::as_str).map(str::to_string))
                .unwrap_or(body);
            return Err(ClientError::Status {
                status: status.as_u16(),
                detail,
            });
        }
        Ok(response.json().await?)
    }

    /// Join path segments onto the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = Url::parse(&self.server_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {e}", self.server_url)))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(format!("{}: not a base URL", self.server_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> ClientResult<T> {
        let url = self.endpoint(segments)?;
        let response = self.client.get(url).send().await?;
        Self::decode(response).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &ExecutionRequest,
    ) -> ClientResult<T> {
        let url = self.endpoint(segments)?;
        let response = self.client.post(url).json(body).send().await?;
        Self::decode(response).await
    }

    /// Check server health.
    ///
    /// Never fails: an unreachable server reports `status: "unhealthy"`.
    pub async fn health_check(&self) -> Value {
        match self.get::<Value>(&["health"]).await {
            Ok(health) => {
                info!(status = ?health.get("status"), "Health check completed");
                health
            }
            Err(e) => {
                error!(error = %e, "Health check failed");
                json!({ "status": "unhealthy", "error": e.to_string() })
            }
        }
    }

    /// List the server's tools. Empty when the server cannot be reached.
    pub async fn list_tools(&self) -> Vec<ToolDescriptor> {
        match self.get::<ToolListResponse>(&["tools"]).await {
            Ok(list) => {
                info!(count = list.tools.len(), "Available tools retrieved");
                list.tools
            }
            Err(e) => {
                error!(error = %e, "Failed to list tools");
                Vec::new()
            }
        }
    }

    /// Describe one tool. `None` when the server does not know it.
    pub async fn get_tool(&self, name: &str) -> ClientResult<Option<ToolDescriptor>> {
        match self.get(&["tools", name]).await {
            Ok(tool) => Ok(Some(tool)),
            Err(e) if e.is_not_found() => {
                warn!(tool_name = name, "Tool not found");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Execute any tool.
    ///
    /// Transport failures come back as a failed result with `data: null`
    /// and the tool name in the metadata.
    #[instrument(skip(self, inputs, metadata))]
    pub async fn execute_tool(
        &self,
        tool_name: &str,
        inputs: JsonObject,
        metadata: JsonObject,
    ) -> ExecutionResult {
        let request = ExecutionRequest::new(tool_name, inputs).with_metadata(metadata);
        info!(inputs = ?request.inputs, "Executing tool");

        match self.post::<ExecutionResult>(&["execute"], &request).await {
            Ok(result) => {
                if result.success {
                    info!("Tool execution successful");
                } else {
                    error!(error = ?result.error, "Tool execution failed");
                }
                result
            }
            Err(e) => {
                error!(error = %e, "Tool execution error");
                let mut metadata = JsonObject::new();
                metadata.insert("tool_name".to_string(), json!(tool_name));
                ExecutionResult::unreachable(e.to_string(), None, metadata)
            }
        }
    }

    /// Run the document search tool.
    ///
    /// Transport failures come back as a failed result with `data: []`.
    #[instrument(skip_all, fields(limit = search.limit, skip = search.skip))]
    pub async fn search_documents(&self, search: SearchRequest) -> ExecutionResult {
        info!(query = ?search.query, "Searching documents");

        let mut metadata = JsonObject::new();
        metadata.insert("client_request".to_string(), json!(true));
        let request = ExecutionRequest::new(DocumentSearchTool::NAME, search.into_inputs())
            .with_metadata(metadata);

        match self.post::<ExecutionResult>(&["execute"], &request).await {
            Ok(result) => {
                if result.success {
                    info!(
                        returned_count = result.returned_count(),
                        total_count = ?result.metadata.get("total_count"),
                        "Document search successful"
                    );
                } else {
                    error!(error = ?result.error, "Document search failed");
                }
                result
            }
            Err(e) => {
                error!(error = %e, "Document search error");
                ExecutionResult::unreachable(e.to_string(), Some(json!([])), JsonObject::new())
            }
        }
    }

    /// Answer a free-text prompt with a text search over the documents.
    ///
    /// The result metadata always carries `original_prompt` and
    /// `query_type`.
    pub async fn process_prompt(&self, prompt: &str) -> ExecutionResult {
        let query = text_search_filter(prompt);
        info!(prompt, generated_query = ?query, "Processing prompt");

        let mut result = self
            .search_documents(SearchRequest::new(query).limit(PROMPT_RESULT_LIMIT))
            .await;

        result
            .metadata
            .insert("original_prompt".to_string(), json!(prompt));
        result
            .metadata
            .insert("query_type".to_string(), json!(prompt::TEXT_SEARCH));
        result
    }
}

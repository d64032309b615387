//! MCP Server implementation and lifecycle management.
//!
//! This module contains the main server handler. It owns the tool registry
//! and answers both transports:
//! - the HTTP transport calls the plain methods (`list_tools`, `execute`, ...)
//! - the STDIO transport goes through the rmcp `ServerHandler` impl, whose
//!   ToolRouter is built from the same registry in `domains/tools/router.rs`
//!
//! **Adding a new tool does NOT require modifying this file!**

use std::sync::Arc;

use rmcp::{ServerHandler, handler::server::tool::ToolRouter, model::*, tool_handler};
use tracing::{info, instrument};

use super::config::Config;
use crate::domains::store::{DocumentStore, InMemoryStore};
use crate::domains::tools::{
    ExecutionRequest, ExecutionResponse, ToolDescriptor, ToolRegistry, build_tool_router,
};

/// The main MCP server handler.
///
/// Cheap to clone: every clone shares the same configuration and registry.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Registered tools, shared read-only.
    registry: Arc<ToolRegistry>,

    /// Tool router for handling MCP tool calls.
    tool_router: ToolRouter<Self>,
}

impl McpServer {
    /// Create a new MCP server around an already built registry.
    pub fn new(config: Config, registry: ToolRegistry) -> Self {
        let config = Arc::new(config);
        let registry = Arc::new(registry);

        Self {
            tool_router: build_tool_router::<Self>(registry.clone(), config.execution.timeout()),
            config,
            registry,
        }
    }

    /// Build the document store and default tools described by `config`.
    pub fn from_config(config: Config) -> crate::Result<Self> {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::from_config(&config.store)?);
        let registry = ToolRegistry::with_defaults(store);
        Ok(Self::new(config, registry))
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Get the tool protocol version.
    pub fn mcp_version(&self) -> &str {
        &self.config.server.mcp_version
    }

    /// Number of registered tools.
    pub fn tools_count(&self) -> usize {
        self.registry.len()
    }

    // ========================================================================
    // HTTP Transport Support Methods
    // ========================================================================

    /// Describe all available tools.
    pub fn list_tools(&self) -> Vec<ToolDescriptor> {
        self.registry.list()
    }

    /// Describe one tool, if registered.
    pub fn get_tool(&self, name: &str) -> Option<ToolDescriptor> {
        self.registry.get(name).map(|tool| tool.describe())
    }

    /// Execute a request against the registry.
    ///
    /// The returned envelope carries the request metadata overlaid with the
    /// tool's own metadata.
    #[instrument(skip_all, fields(tool_name = %request.tool_name))]
    pub async fn execute(&self, request: ExecutionRequest) -> ExecutionResponse {
        info!(inputs = ?request.inputs, "Tool execution request received");

        let result = self
            .registry
            .dispatch_with_timeout(
                &request.tool_name,
                request.inputs,
                self.config.execution.timeout(),
            )
            .await
            .merge_request_metadata(request.metadata);

        info!(success = result.success, "Tool execution response prepared");
        ExecutionResponse::new(result, self.mcp_version())
    }
}

/// ServerHandler implementation with tool_handler macro for automatic tool routing.
#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Document search server. Call document_search with a query filter to \
                 retrieve paginated documents."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: self.name().to_string(),
                version: self.version().to_string(),
                ..Implementation::from_build_env()
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::store::JsonObject;
    use crate::domains::tools::{Tool, ToolOutcome, ToolOutput};
    use async_trait::async_trait;
    use serde_json::{Value, json};

    struct StaticTool;

    #[async_trait]
    impl Tool for StaticTool {
        fn name(&self) -> &str {
            "static"
        }

        fn description(&self) -> &str {
            "Returns fixed metadata"
        }

        fn schema(&self) -> Value {
            json!({ "type": "object" })
        }

        async fn execute(&self, _inputs: JsonObject) -> ToolOutcome {
            let metadata = json!({ "x": 2, "y": 3 }).as_object().cloned().unwrap_or_default();
            Ok(ToolOutput::new(json!([]), metadata))
        }
    }

    fn server_with_static_tool() -> McpServer {
        let mut registry = ToolRegistry::new();
        registry.register(StaticTool);
        McpServer::new(Config::default(), registry)
    }

    #[test]
    fn test_from_default_config() {
        let server = McpServer::from_config(Config::default()).unwrap();
        assert_eq!(server.tools_count(), 1);
        assert_eq!(server.mcp_version(), "1.0.0");
        assert!(server.get_tool("document_search").is_some());
        assert!(server.get_tool("missing").is_none());
    }

    #[test]
    fn test_router_mirrors_registry() {
        let server = server_with_static_tool();
        let routed = server.tool_router.list_all();
        assert_eq!(routed.len(), 1);
        assert_eq!(routed[0].name.as_ref(), "static");
    }

    #[test]
    fn test_get_info_enables_tools() {
        let info = server_with_static_tool().get_info();
        assert!(info.capabilities.tools.is_some());
    }

    #[test]
    fn test_get_info_reports_configured_identity() {
        let mut config = Config::default();
        config.server.name = "docs-east".into();
        config.server.version = "2.3.4".into();
        let server = McpServer::new(config, ToolRegistry::new());

        let info = server.get_info();
        assert_eq!(info.server_info.name, "docs-east");
        assert_eq!(info.server_info.version, "2.3.4");
        assert_eq!(server.name(), "docs-east");
        assert_eq!(server.version(), "2.3.4");
    }

    #[tokio::test]
    async fn test_execute_merges_metadata_tool_wins() {
        let server = server_with_static_tool();
        let request = ExecutionRequest::new("static", JsonObject::new())
            .with_metadata(json!({ "x": 1 }).as_object().cloned().unwrap());

        let response = server.execute(request).await;
        assert!(response.result.success);
        assert_eq!(response.mcp_version, "1.0.0");
        assert_eq!(
            Value::Object(response.result.metadata),
            json!({ "x": 2, "y": 3 })
        );
    }

    #[tokio::test]
    async fn test_execute_unknown_tool_keeps_request_metadata() {
        let server = server_with_static_tool();
        let request = ExecutionRequest::new("nonexistent", JsonObject::new())
            .with_metadata(json!({ "trace": "t-1" }).as_object().cloned().unwrap());

        let response = server.execute(request).await;
        assert!(!response.result.success);
        assert_eq!(response.result.metadata["trace"], json!("t-1"));
        assert_eq!(response.result.metadata["available_tools"], json!(["static"]));
    }
}

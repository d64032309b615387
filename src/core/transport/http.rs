//! HTTP transport implementation.
//!
//! Serves the REST tool protocol so that standard HTTP clients (curl,
//! browsers, the bundled `McpClient`) can list and execute tools.
//!
//! | Method | Path            | Body                                  |
//! |--------|-----------------|---------------------------------------|
//! | GET    | `/`             | server banner                         |
//! | GET    | `/health`       | health and tool count                 |
//! | GET    | `/tools`        | every tool descriptor                 |
//! | GET    | `/tools/{name}` | one descriptor, 404 when unknown      |
//! | POST   | `/execute`      | execution envelope, always HTTP 200   |

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, instrument, warn};

use super::{TransportError, TransportResult, config::HttpConfig};
use crate::core::McpServer;
use crate::domains::tools::{ExecutionRequest, ToolListResponse};

/// HTTP transport handler.
pub struct HttpTransport {
    config: HttpConfig,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given config.
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        self.config.address()
    }

    /// Run the HTTP transport until Ctrl-C.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        let addr = self.address();

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        let cors_status = if self.config.enable_cors {
            "enabled"
        } else {
            "disabled"
        };
        info!(
            "Ready - listening on {} (tool protocol over HTTP, CORS {})",
            addr, cors_status
        );
        info!("  → Tools:   GET /tools, GET /tools/{{name}}");
        info!("  → Execute: POST /execute");
        info!("  → Health:  GET /health");

        let app = router(server, self.config.enable_cors);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("MCP Server shutting down");
        Ok(())
    }
}

/// Build the axum router for `server`.
pub fn router(server: McpServer, enable_cors: bool) -> Router {
    let mut app = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .route("/tools", get(list_tools))
        .route("/tools/{name}", get(get_tool))
        .route("/execute", post(execute_tool))
        .layer(TraceLayer::new_for_http())
        .with_state(server);

    if enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Root handler - server banner.
async fn root_handler(State(server): State<McpServer>) -> impl IntoResponse {
    Json(json!({
        "message": "MCP Server is running",
        "version": server.mcp_version(),
        "status": "active"
    }))
}

/// Health check endpoint.
async fn health_check(State(server): State<McpServer>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "version": server.mcp_version(),
        "tools_count": server.tools_count(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// List every registered tool.
#[instrument(skip_all)]
async fn list_tools(State(server): State<McpServer>) -> Json<ToolListResponse> {
    let tools = server.list_tools();
    info!(count = tools.len(), "Tools listed");

    Json(ToolListResponse {
        count: tools.len(),
        tools,
        mcp_version: server.mcp_version().to_string(),
    })
}

/// Describe one tool.
#[instrument(skip_all, fields(tool_name = %name))]
async fn get_tool(State(server): State<McpServer>, Path(name): Path<String>) -> Response {
    match server.get_tool(&name) {
        Some(descriptor) => Json(descriptor).into_response(),
        None => {
            warn!("Tool not found");
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "detail": format!("Tool '{}' not found", name) })),
            )
                .into_response()
        }
    }
}

/// Execute a tool. Always answers 200; the outcome lives in the body.
async fn execute_tool(
    State(server): State<McpServer>,
    Json(request): Json<ExecutionRequest>,
) -> impl IntoResponse {
    (StatusCode::OK, Json(server.execute(request).await))
}

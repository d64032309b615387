//! Tool Router - builds the rmcp ToolRouter from the registry.
//!
//! The STDIO transport speaks native MCP, so every registered tool is
//! exposed as an rmcp route that dispatches back into the same
//! [`ToolRegistry`] the HTTP transport uses.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use rmcp::{
    ErrorData as McpError,
    handler::server::tool::{ToolCallContext, ToolRoute, ToolRouter},
    model::{CallToolResult, Content, Tool as McpTool},
};
use serde_json::Value;
use tracing::warn;

use super::envelope::ExecutionResult;
use super::handlers::ToolDescriptor;
use super::registry::ToolRegistry;
use crate::domains::store::JsonObject;

/// Build the tool router with every tool in `registry`.
pub fn build_tool_router<S>(registry: Arc<ToolRegistry>, timeout: Duration) -> ToolRouter<S>
where
    S: Send + Sync + 'static,
{
    registry
        .list()
        .into_iter()
        .fold(ToolRouter::new(), |router, descriptor| {
            router.with_route(create_route(registry.clone(), descriptor, timeout))
        })
}

fn create_route<S>(
    registry: Arc<ToolRegistry>,
    descriptor: ToolDescriptor,
    timeout: Duration,
) -> ToolRoute<S>
where
    S: Send + Sync + 'static,
{
    let name = descriptor.name.clone();
    ToolRoute::new_dyn(to_mcp_tool(descriptor), move |ctx: ToolCallContext<'_, S>| {
        let inputs = ctx.arguments.clone().unwrap_or_default();
        let registry = registry.clone();
        let name = name.clone();
        async move {
            let result = registry.dispatch_with_timeout(&name, inputs, timeout).await;
            Ok::<_, McpError>(to_call_result(result))
        }
        .boxed()
    })
}

/// Convert a descriptor into the rmcp tool model.
pub(crate) fn to_mcp_tool(descriptor: ToolDescriptor) -> McpTool {
    let input_schema = match descriptor.schema {
        Value::Object(schema) => schema,
        other => {
            warn!(tool_name = %descriptor.name, schema = %other, "Tool schema is not an object");
            JsonObject::new()
        }
    };

    McpTool {
        name: descriptor.name.into(),
        description: Some(descriptor.description.into()),
        input_schema: Arc::new(input_schema),
        annotations: None,
        output_schema: None,
        icons: None,
        meta: None,
        title: None,
    }
}

/// Convert an execution result into an MCP tool call result.
///
/// The text content carries the data (or the error message); the full
/// envelope travels as structured content.
pub(crate) fn to_call_result(result: ExecutionResult) -> CallToolResult {
    let text = match (&result.data, &result.error) {
        (_, Some(error)) if !result.success => error.clone(),
        (Some(data), _) => data.to_string(),
        _ => String::new(),
    };

    CallToolResult {
        content: vec![Content::text(text)],
        structured_content: serde_json::to_value(&result).ok(),
        is_error: Some(!result.success),
        meta: None,
    }
}

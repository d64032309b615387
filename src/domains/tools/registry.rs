//! Tool Registry - central registration and dispatch for all tools.
//!
//! This module provides:
//! - A name-keyed registry of tool trait objects, in registration order
//! - Tool descriptors for listing
//! - Dispatch that always produces an [`ExecutionResult`]

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde_json::{Value, json};
use tracing::{error, info, instrument, warn};

use super::definitions::DocumentSearchTool;
use super::envelope::ExecutionResult;
use super::error::ToolError;
use super::handlers::{Tool, ToolDescriptor};
use crate::domains::store::{DocumentStore, JsonObject};

// ============================================================================
// Tool Registry
// ============================================================================

/// Tool registry - owns every available tool.
///
/// Built once at startup and then shared read-only, so dispatch needs no
/// locking. Registering a name twice replaces the earlier tool but keeps
/// its listing position.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the default tools backed by `store`.
    pub fn with_defaults(store: Arc<dyn DocumentStore>) -> Self {
        let mut registry = Self::new();
        registry.register(DocumentSearchTool::new(store));

        info!(
            tool_count = registry.len(),
            tools = ?registry.tool_names(),
            "Default tools registered"
        );
        registry
    }

    /// Register a tool.
    pub fn register(&mut self, tool: impl Tool + 'static) {
        self.register_arc(Arc::new(tool));
    }

    /// Register an already shared tool.
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        info!(
            tool_name = %name,
            tool_description = tool.description(),
            "Tool registered"
        );

        match self.index.get(&name) {
            Some(&slot) => {
                warn!(tool_name = %name, "Replacing previously registered tool");
                self.tools[slot] = tool;
            }
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index.get(name).map(|&slot| self.tools[slot].clone())
    }

    /// Describe every registered tool, in registration order.
    pub fn list(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|tool| tool.describe()).collect()
    }

    /// Get all tool names, in registration order.
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|tool| tool.name().to_string()).collect()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool by name.
    ///
    /// Never fails: unknown names and tools that panic both come back as
    /// failed results.
    #[instrument(skip(self, inputs))]
    pub async fn dispatch(&self, name: &str, inputs: JsonObject) -> ExecutionResult {
        let Some(tool) = self.get(name) else {
            let error = ToolError::not_found(name);
            error!(error = %error, "Tool execution failed");

            let mut metadata = JsonObject::new();
            metadata.insert("available_tools".to_string(), json!(self.tool_names()));
            return ExecutionResult::failure(error, metadata);
        };

        info!(inputs = %serde_json::Value::Object(inputs.clone()), "Executing tool");

        match AssertUnwindSafe(tool.execute(inputs)).catch_unwind().await {
            Ok(outcome) => {
                let result = ExecutionResult::from(outcome);
                info!(success = result.success, "Tool execution completed");
                result
            }
            Err(panic) => {
                let error = ToolError::internal(panic_message(panic.as_ref()));
                error!(error = %error, "Tool execution exception");

                let mut metadata = JsonObject::new();
                metadata.insert("tool_name".to_string(), json!(name));
                ExecutionResult::failure(error, metadata)
            }
        }
    }

    /// Execute a tool by name, giving up after `timeout`.
    pub async fn dispatch_with_timeout(
        &self,
        name: &str,
        inputs: JsonObject,
        timeout: Duration,
    ) -> ExecutionResult {
        match tokio::time::timeout(timeout, self.dispatch(name, inputs)).await {
            Ok(result) => result,
            Err(_) => {
                let error = ToolError::Timeout(timeout.as_millis() as u64);
                warn!(tool_name = name, error = %error, "Tool execution timed out");

                let mut metadata = JsonObject::new();
                metadata.insert("tool_name".to_string(), json!(name));
                ExecutionResult::failure(error, metadata)
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "tool panicked".to_string()
    }
}

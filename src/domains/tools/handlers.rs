//! Tool handler contract.
//!
//! Every tool implements [`Tool`]. Execution returns a [`ToolOutcome`]: a
//! `Result` whose error side is a [`ToolFailure`] carrying the message and
//! whatever context metadata the tool knew when it failed. Tools report all
//! failures this way and never panic on bad input or downstream errors.

use std::fmt::Display;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::ToolError;
use crate::domains::store::JsonObject;

/// Public contract of a tool: name, description and input schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique name used for dispatch.
    pub name: String,

    /// Human-readable description.
    pub description: String,

    /// JSON Schema describing the accepted inputs.
    pub schema: Value,
}

/// Successful tool output.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    /// The result data from the tool.
    pub data: Value,

    /// Tool-specific metadata about the result.
    pub metadata: JsonObject,
}

/// Failed tool output.
#[derive(Debug)]
pub struct ToolFailure {
    /// What went wrong.
    pub error: ToolError,

    /// Message reported to the caller.
    pub message: String,

    /// Context known at the time of failure.
    pub metadata: JsonObject,
}

/// Result of executing a tool.
pub type ToolOutcome = Result<ToolOutput, ToolFailure>;

impl ToolOutput {
    /// Create a tool output.
    pub fn new(data: Value, metadata: JsonObject) -> Self {
        Self { data, metadata }
    }
}

impl ToolFailure {
    /// Create a failure whose message is the error's own message.
    pub fn new(error: ToolError) -> Self {
        Self {
            message: error.to_string(),
            error,
            metadata: JsonObject::new(),
        }
    }

    /// Prefix the message with a short description of the failed operation.
    pub fn context(mut self, context: impl Display) -> Self {
        self.message = format!("{}: {}", context, self.message);
        self
    }

    /// Attach one metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

impl From<ToolError> for ToolFailure {
    fn from(error: ToolError) -> Self {
        Self::new(error)
    }
}

/// Trait implemented by every registered tool.
///
/// `execute` may suspend on I/O and is called concurrently from many
/// requests, so implementations hold only shared, read-safe state.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name of this tool.
    fn name(&self) -> &str;

    /// Description of this tool.
    fn description(&self) -> &str;

    /// JSON Schema for this tool's inputs.
    fn schema(&self) -> Value;

    /// Describe this tool.
    fn describe(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
            schema: self.schema(),
        }
    }

    /// Execute the tool with the given inputs.
    async fn execute(&self, inputs: JsonObject) -> ToolOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echo inputs back"
        }

        fn schema(&self) -> Value {
            json!({ "type": "object" })
        }

        async fn execute(&self, inputs: JsonObject) -> ToolOutcome {
            Ok(ToolOutput::new(Value::Object(inputs), JsonObject::new()))
        }
    }

    #[test]
    fn test_describe_uses_trait_methods() {
        let descriptor = EchoTool.describe();
        assert_eq!(descriptor.name, "echo");
        assert_eq!(descriptor.description, "Echo inputs back");
        assert_eq!(descriptor.schema, json!({ "type": "object" }));
    }

    #[tokio::test]
    async fn test_execute_returns_output() {
        let mut inputs = JsonObject::new();
        inputs.insert("a".into(), json!(1));
        let output = EchoTool.execute(inputs).await.unwrap();
        assert_eq!(output.data, json!({ "a": 1 }));
    }

    #[test]
    fn test_failure_context_and_metadata() {
        let failure = ToolFailure::new(ToolError::invalid_input("limit too large"))
            .context("Document search failed")
            .with_metadata("query", json!({}));
        assert_eq!(
            failure.message,
            "Document search failed: Invalid input: limit too large"
        );
        assert_eq!(failure.metadata["query"], json!({}));
    }
}

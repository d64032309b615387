//! Wire envelope of the tool execution protocol.
//!
//! A request names a tool and carries its inputs plus free-form caller
//! metadata. Every execution, successful or not, produces the same
//! [`ExecutionResult`] shape: `success`, `data`, `error` and `metadata` are
//! always present, with `data`/`error` set to `null` when unused.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{ErrorKind, ToolError};
use super::handlers::{ToolDescriptor, ToolFailure, ToolOutcome, ToolOutput};
use crate::domains::store::JsonObject;

/// A request to execute one tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// The name of the tool to execute.
    pub tool_name: String,

    /// The inputs to pass to the tool.
    #[serde(default)]
    pub inputs: JsonObject,

    /// Caller metadata, echoed back in the result unless the tool
    /// overrides a key.
    #[serde(default)]
    pub metadata: JsonObject,
}

impl ExecutionRequest {
    /// Create a request with empty metadata.
    pub fn new(tool_name: impl Into<String>, inputs: JsonObject) -> Self {
        Self {
            tool_name: tool_name.into(),
            inputs,
            metadata: JsonObject::new(),
        }
    }

    /// Replace the request metadata.
    pub fn with_metadata(mut self, metadata: JsonObject) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Uniform result of a tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Whether the execution was successful.
    pub success: bool,

    /// The result data, `null` on failure.
    #[serde(default)]
    pub data: Option<Value>,

    /// The error message, `null` on success.
    #[serde(default)]
    pub error: Option<String>,

    /// Classification of the failure. Omitted on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,

    /// Contextual metadata. Never null.
    #[serde(default)]
    pub metadata: JsonObject,
}

impl ExecutionResult {
    /// Create a successful result.
    pub fn success(data: Value, metadata: JsonObject) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            error_kind: None,
            metadata,
        }
    }

    /// Create a failed result from a tool error.
    pub fn failure(error: ToolError, metadata: JsonObject) -> Self {
        let mut failure = ToolFailure::new(error);
        failure.metadata = metadata;
        failure.into()
    }

    /// Create a failed result for an error that happened outside any tool,
    /// such as a client that could not reach the server.
    pub fn unreachable(error: impl Into<String>, data: Option<Value>, metadata: JsonObject) -> Self {
        Self {
            success: false,
            data,
            error: Some(error.into()),
            error_kind: None,
            metadata,
        }
    }

    /// Merge caller metadata underneath this result's metadata.
    ///
    /// Keys from the request survive unless the tool reported the same key,
    /// in which case the tool's value wins.
    pub fn merge_request_metadata(mut self, request_metadata: JsonObject) -> Self {
        let mut merged = request_metadata;
        merged.extend(std::mem::take(&mut self.metadata));
        self.metadata = merged;
        self
    }

    /// Number of records in `data` when it holds an array.
    pub fn returned_count(&self) -> usize {
        self.data
            .as_ref()
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }
}

impl From<ToolOutput> for ExecutionResult {
    fn from(output: ToolOutput) -> Self {
        Self::success(output.data, output.metadata)
    }
}

impl From<ToolFailure> for ExecutionResult {
    fn from(failure: ToolFailure) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(failure.message),
            error_kind: Some(failure.error.kind()),
            metadata: failure.metadata,
        }
    }
}

impl From<ToolOutcome> for ExecutionResult {
    fn from(outcome: ToolOutcome) -> Self {
        match outcome {
            Ok(output) => output.into(),
            Err(failure) => failure.into(),
        }
    }
}

/// `/execute` response body: the result plus the protocol version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResponse {
    #[serde(flatten)]
    pub result: ExecutionResult,

    /// Protocol version of the server.
    pub mcp_version: String,
}

impl ExecutionResponse {
    /// Wrap a result with the protocol version.
    pub fn new(result: ExecutionResult, mcp_version: impl Into<String>) -> Self {
        Self {
            result,
            mcp_version: mcp_version.into(),
        }
    }
}

/// `/tools` response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolListResponse {
    pub tools: Vec<ToolDescriptor>,
    pub count: usize,
    pub mcp_version: String,
}

//! Tool-specific error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domains::store::StoreError;

/// Errors that can occur during tool operations.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Tool inputs failed schema or range validation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The requested tool was not found.
    #[error("Tool '{0}' not found")]
    NotFound(String),

    /// The backing store failed or rejected the request.
    #[error("{0}")]
    Downstream(#[from] StoreError),

    /// The tool did not finish within the execution timeout.
    #[error("Tool execution timed out after {0} ms")]
    Timeout(u64),

    /// A tool broke its execution contract.
    #[error("Tool execution error: {0}")]
    Internal(String),
}

/// Machine-readable classification of a failed execution.
///
/// Carried on the wire as `error_kind` next to the human-readable message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    ToolNotFound,
    DownstreamFailure,
    Timeout,
    InternalDispatchError,
}

impl ToolError {
    /// Create a new "invalid input" error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new "not found" error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a new "internal" error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::NotFound(_) => ErrorKind::ToolNotFound,
            Self::Downstream(_) => ErrorKind::DownstreamFailure,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Internal(_) => ErrorKind::InternalDispatchError,
        }
    }
}

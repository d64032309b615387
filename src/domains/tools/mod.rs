//! Tools domain module.
//!
//! This module handles all tool-related functionality for the MCP server.
//! Tools are named operations with a declared input schema that clients
//! invoke through the execution protocol.
//!
//! ## Architecture
//!
//! - `definitions/` - Individual tool implementations (one file per tool)
//! - `handlers.rs` - The `Tool` trait and tool output types
//! - `envelope.rs` - Request/result envelope of the execution protocol
//! - `registry.rs` - Central tool registry and dispatch
//! - `router.rs` - rmcp ToolRouter built from the registry (STDIO transport)
//! - `error.rs` - Tool-specific error types
//!
//! ## Adding a New Tool
//!
//! 1. Create a new file in `definitions/` (e.g., `my_tool.rs`)
//! 2. Implement the `Tool` trait for it
//! 3. Export it in `definitions/mod.rs`
//! 4. Register it in `ToolRegistry::with_defaults`
//!
//! Both transports pick the tool up from the registry automatically.

pub mod definitions;
pub mod envelope;
mod error;
mod handlers;
mod registry;
pub mod router;

pub use envelope::{ExecutionRequest, ExecutionResponse, ExecutionResult, ToolListResponse};
pub use error::{ErrorKind, ToolError};
pub use handlers::{Tool, ToolDescriptor, ToolFailure, ToolOutcome, ToolOutput};
pub use registry::ToolRegistry;
pub use router::build_tool_router;

//! Document MCP Server Library
//!
//! This crate provides a Model Context Protocol (MCP) tool server that exposes
//! a document search tool, along with an HTTP client for it.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - **core**: Core infrastructure including configuration, error handling,
//!   the main server, and transports (HTTP and STDIO)
//! - **domains**: Business logic organized by bounded contexts
//!   - **store**: The document store capability and its in-memory implementation
//!   - **tools**: Tool contract, registry, and the document search tool
//! - **client**: HTTP client for a running server, including prompt search
//!
//! # Example
//!
//! ```rust,no_run
//! use document_mcp_server::core::{Config, McpServer, TransportService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let server = McpServer::from_config(config.clone())?;
//!     TransportService::new(config.transport).run(server).await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use client::McpClient;
pub use crate::core::{Config, Error, McpServer, Result};

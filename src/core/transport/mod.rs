//! Transport layer for the MCP server.
//!
//! This module provides different transport implementations:
//! - **HTTP**: REST tool protocol (`/tools`, `/execute`, ...) - feature: `http`
//! - **STDIO**: Standard input/output speaking native MCP - feature: `stdio`
//!
//! Both transports share one [`McpServer`](crate::core::McpServer) and
//! therefore one tool registry.
//!
//! # Feature Flags
//!
//! Transport implementations are conditionally compiled based on features:
//! - `http` (default): HTTP transport - adds axum, tower-http
//! - `stdio` (default): STDIO transport through rmcp

mod config;
mod error;
mod service;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "stdio")]
pub mod stdio;

pub use config::{TransportConfig, default_host, default_port};
pub use error::{TransportError, TransportResult};
pub use service::TransportService;

#[cfg(feature = "http")]
pub use config::HttpConfig;

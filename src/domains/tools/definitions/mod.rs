//! Tool definitions module.
//!
//! This module exports all available tool definitions.
//! Each tool is defined in its own file for better maintainability.

pub mod document_search;

pub use document_search::{DocumentSearchTool, SearchMetadata, SearchQuery};

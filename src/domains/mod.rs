//! Domains module containing business logic organized by bounded contexts.
//!
//! - **store**: The document store capability and its in-memory implementation
//! - **tools**: Tool contract, registry, and the document search tool

pub mod store;
pub mod tools;

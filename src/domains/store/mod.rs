//! Document store domain.
//!
//! The search tool never talks to a database directly. It goes through the
//! [`DocumentStore`] trait, which exposes the two round trips a paginated
//! search needs: a filtered, windowed query and a filtered count.
//!
//! ## Architecture
//!
//! - `error.rs` - Store error types
//! - `filter.rs` - Query filter compilation and matching
//! - `memory.rs` - In-memory store loaded from a JSON file

mod error;
pub mod filter;
mod memory;

use async_trait::async_trait;
use serde_json::Value;

pub use error::{StoreError, StoreResult};
pub use filter::Filter;
pub use memory::InMemoryStore;

/// A JSON object with string keys.
pub type JsonObject = serde_json::Map<String, Value>;

/// A single stored record.
pub type Document = JsonObject;

/// Key holding a document's unique identifier.
///
/// Identifiers are always plain strings once they leave a store.
pub const ID_FIELD: &str = "_id";

/// Capability contract for a document collection.
///
/// Implementations must be safe to call concurrently; the server issues
/// overlapping reads without any locking of its own.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Return up to `limit` documents matching `filter`, after skipping the
    /// first `skip` matches. Order is the store's natural order.
    async fn query(&self, filter: &JsonObject, limit: u32, skip: u64)
    -> StoreResult<Vec<Document>>;

    /// Count all documents matching `filter`, ignoring any window.
    async fn count(&self, filter: &JsonObject) -> StoreResult<u64>;

    /// Fetch a single document by identifier.
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<Document>> {
        let mut filter = JsonObject::new();
        filter.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
        Ok(self.query(&filter, 1, 0).await?.into_iter().next())
    }
}

/// Convert a store-native identifier into a plain string in place.
///
/// Handles extended-JSON object ids (`{"$oid": "..."}`) and numeric ids.
/// Documents without an identifier are left untouched.
pub fn normalize_id(document: &mut Document) {
    let Some(id) = document.get_mut(ID_FIELD) else {
        return;
    };

    let normalized = match &*id {
        Value::String(_) => return,
        Value::Object(inner) => match inner.get("$oid").and_then(Value::as_str) {
            Some(oid) => oid.to_string(),
            None => Value::Object(inner.clone()).to_string(),
        },
        other => other.to_string(),
    };

    *id = Value::String(normalized);
}

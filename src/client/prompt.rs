//! Prompt translation.
//!
//! Turns free text into a document filter: a case-insensitive pattern match
//! against the text-bearing fields of a document.

use serde_json::{Value, json};

use crate::domains::store::JsonObject;

/// Maximum number of documents requested for a prompt.
pub const PROMPT_RESULT_LIMIT: u32 = 20;

/// Fields searched for prompt text.
pub const PROMPT_FIELDS: [&str; 3] = ["content", "title", "description"];

/// Value reported as `query_type` for prompt searches.
pub const TEXT_SEARCH: &str = "text_search";

/// Build the filter for a prompt.
///
/// The normalized prompt is used as a pattern as-is, so characters with
/// pattern meaning keep that meaning.
pub fn text_search_filter(prompt: &str) -> JsonObject {
    let terms = prompt.trim().to_lowercase();

    let clauses: Vec<Value> = PROMPT_FIELDS
        .iter()
        .map(|field| json!({ (*field): { "$regex": terms, "$options": "i" } }))
        .collect();

    let mut filter = JsonObject::new();
    filter.insert("$or".to_string(), Value::Array(clauses));
    filter
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_shape() {
        let filter = text_search_filter("python");
        assert_eq!(
            Value::Object(filter),
            json!({
                "$or": [
                    { "content": { "$regex": "python", "$options": "i" } },
                    { "title": { "$regex": "python", "$options": "i" } },
                    { "description": { "$regex": "python", "$options": "i" } }
                ]
            })
        );
    }

    #[test]
    fn test_prompt_is_trimmed_and_lowercased() {
        let filter = text_search_filter("  Rust Async \n");
        assert_eq!(filter["$or"][0]["content"]["$regex"], json!("rust async"));
    }
}

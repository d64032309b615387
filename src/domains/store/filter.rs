//! Query filter compilation and matching.
//!
//! Filters use the familiar Mongo-style JSON shape. A filter is compiled
//! once per store call (regexes included) and then evaluated against each
//! document without further error handling.
//!
//! Supported syntax:
//! - field equality, including dotted paths (`{"author.name": "Ann"}`);
//!   a path segment that meets an array of sub-documents matches against
//!   every element
//! - logical operators `$and`, `$or`, `$nor`
//! - field operators `$eq`, `$ne`, `$gt`, `$gte`, `$lt`, `$lte`, `$in`,
//!   `$nin`, `$exists`, `$not`, `$regex` (with `$options` flags `imsx`)

use std::borrow::Cow;
use std::cmp::Ordering;

use regex::{Regex, RegexBuilder};
use serde_json::Value;

use super::error::{StoreError, StoreResult};
use super::{Document, JsonObject};

/// A compiled document filter.
#[derive(Debug, Clone)]
pub enum Filter {
    /// Every clause must match. An empty list matches everything.
    And(Vec<Filter>),
    /// At least one clause must match.
    Or(Vec<Filter>),
    /// No clause may match.
    Nor(Vec<Filter>),
    /// A predicate applied to the value at `path`.
    Field { path: String, predicate: Predicate },
}

/// A compiled condition on a single field value.
#[derive(Debug, Clone)]
pub enum Predicate {
    Eq(Value),
    Ne(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    In(Vec<Value>),
    Nin(Vec<Value>),
    Exists(bool),
    Regex(Regex),
    Not(Box<Predicate>),
    All(Vec<Predicate>),
}

impl Filter {
    /// Compile a JSON filter object.
    pub fn compile(filter: &JsonObject) -> StoreResult<Self> {
        let clauses = filter
            .iter()
            .map(|(key, value)| compile_clause(key, value))
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Self::And(clauses))
    }

    /// Check whether a document satisfies this filter.
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Self::And(clauses) => clauses.iter().all(|clause| clause.matches(document)),
            Self::Or(clauses) => clauses.iter().any(|clause| clause.matches(document)),
            Self::Nor(clauses) => !clauses.iter().any(|clause| clause.matches(document)),
            Self::Field { path, predicate } => predicate.matches(lookup(document, path).as_deref()),
        }
    }
}

impl Predicate {
    /// Compile the condition side of a `field: condition` pair.
    fn compile(condition: &Value) -> StoreResult<Self> {
        let Value::Object(ops) = condition else {
            return Ok(Self::Eq(condition.clone()));
        };

        let operator_count = ops.keys().filter(|key| key.starts_with('$')).count();
        if operator_count == 0 {
            return Ok(Self::Eq(condition.clone()));
        }
        if operator_count != ops.len() {
            return Err(StoreError::invalid_filter(
                "cannot mix operators and plain fields in one condition",
            ));
        }

        let mut predicates = Vec::with_capacity(ops.len());
        for (op, operand) in ops {
            let predicate = match op.as_str() {
                "$eq" => Self::Eq(operand.clone()),
                "$ne" => Self::Ne(operand.clone()),
                "$gt" => Self::Gt(operand.clone()),
                "$gte" => Self::Gte(operand.clone()),
                "$lt" => Self::Lt(operand.clone()),
                "$lte" => Self::Lte(operand.clone()),
                "$in" => Self::In(array_operand(op, operand)?),
                "$nin" => Self::Nin(array_operand(op, operand)?),
                "$exists" => Self::Exists(operand.as_bool().ok_or_else(|| {
                    StoreError::invalid_filter("'$exists' expects a boolean")
                })?),
                "$regex" => {
                    let options = match ops.get("$options") {
                        None => "",
                        Some(Value::String(options)) => options.as_str(),
                        Some(_) => {
                            return Err(StoreError::invalid_filter("'$options' must be a string"));
                        }
                    };
                    Self::Regex(compile_regex(operand, options)?)
                }
                "$options" => {
                    if ops.contains_key("$regex") {
                        continue;
                    }
                    return Err(StoreError::invalid_filter("'$options' requires '$regex'"));
                }
                "$not" => match operand {
                    Value::Object(inner)
                        if !inner.is_empty() && inner.keys().all(|k| k.starts_with('$')) =>
                    {
                        Self::Not(Box::new(Self::compile(operand)?))
                    }
                    _ => {
                        return Err(StoreError::invalid_filter(
                            "'$not' expects an operator document",
                        ));
                    }
                },
                other => {
                    return Err(StoreError::invalid_filter(format!(
                        "unsupported operator '{other}'"
                    )));
                }
            };
            predicates.push(predicate);
        }

        Ok(Self::All(predicates))
    }

    /// Evaluate against a field value. `None` means the field is absent.
    fn matches(&self, value: Option<&Value>) -> bool {
        match self {
            Self::Eq(target) => equals(value, target),
            Self::Ne(target) => !equals(value, target),
            Self::Gt(target) => compare_any(value, target, |o| o == Ordering::Greater),
            Self::Gte(target) => compare_any(value, target, |o| o != Ordering::Less),
            Self::Lt(target) => compare_any(value, target, |o| o == Ordering::Less),
            Self::Lte(target) => compare_any(value, target, |o| o != Ordering::Greater),
            Self::In(candidates) => candidates.iter().any(|c| equals(value, c)),
            Self::Nin(candidates) => !candidates.iter().any(|c| equals(value, c)),
            Self::Exists(expected) => value.is_some() == *expected,
            Self::Regex(re) => value.is_some_and(|v| regex_matches(re, v)),
            Self::Not(inner) => !inner.matches(value),
            Self::All(predicates) => predicates.iter().all(|p| p.matches(value)),
        }
    }
}

fn compile_clause(key: &str, value: &Value) -> StoreResult<Filter> {
    match key {
        "$and" => Ok(Filter::And(compile_list(key, value)?)),
        "$or" => Ok(Filter::Or(compile_list(key, value)?)),
        "$nor" => Ok(Filter::Nor(compile_list(key, value)?)),
        op if op.starts_with('$') => Err(StoreError::invalid_filter(format!(
            "unknown top-level operator '{op}'"
        ))),
        path => Ok(Filter::Field {
            path: path.to_string(),
            predicate: Predicate::compile(value)?,
        }),
    }
}

fn compile_list(op: &str, value: &Value) -> StoreResult<Vec<Filter>> {
    let items = value
        .as_array()
        .filter(|items| !items.is_empty())
        .ok_or_else(|| StoreError::invalid_filter(format!("'{op}' expects a non-empty array")))?;

    items
        .iter()
        .map(|item| {
            let clause = item.as_object().ok_or_else(|| {
                StoreError::invalid_filter(format!("'{op}' entries must be objects"))
            })?;
            Filter::compile(clause)
        })
        .collect()
}

fn array_operand(op: &str, operand: &Value) -> StoreResult<Vec<Value>> {
    operand
        .as_array()
        .cloned()
        .ok_or_else(|| StoreError::invalid_filter(format!("'{op}' expects an array")))
}

fn compile_regex(pattern: &Value, options: &str) -> StoreResult<Regex> {
    let pattern = pattern
        .as_str()
        .ok_or_else(|| StoreError::invalid_filter("'$regex' expects a string pattern"))?;

    let mut builder = RegexBuilder::new(pattern);
    for flag in options.chars() {
        match flag {
            'i' => {
                builder.case_insensitive(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            'x' => {
                builder.ignore_whitespace(true);
            }
            other => {
                return Err(StoreError::invalid_filter(format!(
                    "unsupported regex option '{other}'"
                )));
            }
        }
    }

    builder
        .build()
        .map_err(|e| StoreError::invalid_filter(format!("invalid regex '{pattern}': {e}")))
}

/// Resolve a possibly dotted path. A literal key containing dots wins over
/// path traversal.
///
/// A numeric segment indexes into an array. Any other segment applied to an
/// array is resolved against each element, and the hits are gathered into
/// one array so the predicate sees them as "any element matches".
fn lookup<'a>(document: &'a Document, path: &str) -> Option<Cow<'a, Value>> {
    if let Some(value) = document.get(path) {
        return Some(Cow::Borrowed(value));
    }

    let (head, rest) = path.split_once('.')?;
    resolve(document.get(head)?, rest)
}

fn resolve<'a>(value: &'a Value, path: &str) -> Option<Cow<'a, Value>> {
    let (segment, rest) = match path.split_once('.') {
        Some((segment, rest)) => (segment, Some(rest)),
        None => (path, None),
    };

    let next = match value {
        Value::Object(map) => map.get(segment)?,
        Value::Array(items) => match segment.parse::<usize>() {
            Ok(index) => items.get(index)?,
            Err(_) => return fan_out(items, path),
        },
        _ => return None,
    };

    match rest {
        Some(rest) => resolve(next, rest),
        None => Some(Cow::Borrowed(next)),
    }
}

fn fan_out<'a>(items: &'a [Value], path: &str) -> Option<Cow<'a, Value>> {
    let hits: Vec<Value> = items
        .iter()
        .filter(|item| item.is_object())
        .filter_map(|item| resolve(item, path))
        .flat_map(|hit| match hit.into_owned() {
            Value::Array(inner) => inner,
            other => vec![other],
        })
        .collect();

    if hits.is_empty() {
        None
    } else {
        Some(Cow::Owned(Value::Array(hits)))
    }
}

/// Equality with array membership: an array field equals a scalar target if
/// any element does. A missing field equals `null`.
fn equals(value: Option<&Value>, target: &Value) -> bool {
    match value {
        None => target.is_null(),
        Some(Value::Array(items)) if !target.is_array() => {
            items.iter().any(|item| json_eq(item, target))
        }
        Some(value) => json_eq(value, target),
    }
}

/// Structural equality that treats `1` and `1.0` as the same number.
fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| json_eq(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(key, a)| y.get(key).is_some_and(|b| json_eq(a, b)))
        }
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn compare_any(value: Option<&Value>, target: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .any(|item| compare(item, target).is_some_and(&accept)),
        Some(value) => compare(value, target).is_some_and(accept),
        None => false,
    }
}

fn regex_matches(re: &Regex, value: &Value) -> bool {
    match value {
        Value::String(s) => re.is_match(s),
        Value::Array(items) => items
            .iter()
            .any(|item| item.as_str().is_some_and(|s| re.is_match(s))),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> JsonObject {
        value.as_object().cloned().unwrap()
    }

    fn matches(filter: Value, document: Value) -> bool {
        Filter::compile(&object(filter))
            .unwrap()
            .matches(&object(document))
    }

    fn compile_err(filter: Value) -> StoreError {
        Filter::compile(&object(filter)).unwrap_err()
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(matches(json!({}), json!({ "a": 1 })));
    }

    #[test]
    fn test_equality_and_dotted_paths() {
        let doc = json!({ "name": "Ann", "author": { "city": "Oslo" }, "n": 3 });
        assert!(matches(json!({ "name": "Ann" }), doc.clone()));
        assert!(!matches(json!({ "name": "Bob" }), doc.clone()));
        assert!(matches(json!({ "author.city": "Oslo" }), doc.clone()));
        assert!(matches(json!({ "n": 3.0 }), doc.clone()));
        assert!(matches(json!({ "name": "Ann", "n": 3 }), doc));
    }

    #[test]
    fn test_dotted_path_through_array_of_documents() {
        let doc = json!({
            "authors": [
                { "name": "Ann", "age": 40, "tags": ["x"] },
                { "name": "Bob", "age": 25 }
            ]
        });
        assert!(matches(json!({ "authors.name": "Ann" }), doc.clone()));
        assert!(matches(json!({ "authors.name": "Bob" }), doc.clone()));
        assert!(!matches(json!({ "authors.name": "Cy" }), doc.clone()));
        assert!(matches(json!({ "authors.age": { "$lt": 30 } }), doc.clone()));
        assert!(matches(
            json!({ "authors.name": { "$regex": "^b", "$options": "i" } }),
            doc.clone()
        ));
        assert!(matches(json!({ "authors.tags": "x" }), doc.clone()));
        assert!(matches(json!({ "authors.name": { "$exists": true } }), doc.clone()));
        assert!(!matches(
            json!({ "authors.city": { "$exists": true } }),
            doc.clone()
        ));
        assert!(!matches(
            json!({ "authors.name": { "$nin": ["Ann"] } }),
            doc.clone()
        ));
        assert!(matches(json!({ "authors.1.name": "Bob" }), doc.clone()));
        assert!(!matches(json!({ "authors.0.name": "Bob" }), doc));
    }

    #[test]
    fn test_missing_field_equals_null() {
        assert!(matches(json!({ "gone": null }), json!({ "a": 1 })));
        assert!(!matches(json!({ "a": null }), json!({ "a": 1 })));
    }

    #[test]
    fn test_array_membership() {
        let doc = json!({ "tags": ["rust", "async"] });
        assert!(matches(json!({ "tags": "rust" }), doc.clone()));
        assert!(matches(json!({ "tags": ["rust", "async"] }), doc.clone()));
        assert!(!matches(json!({ "tags": "go" }), doc));
    }

    #[test]
    fn test_comparison_operators() {
        let doc = json!({ "age": 30, "name": "m" });
        assert!(matches(json!({ "age": { "$gt": 25 } }), doc.clone()));
        assert!(matches(json!({ "age": { "$gte": 30, "$lt": 31 } }), doc.clone()));
        assert!(!matches(json!({ "age": { "$lte": 29 } }), doc.clone()));
        assert!(matches(json!({ "name": { "$lt": "n" } }), doc.clone()));
        assert!(!matches(json!({ "age": { "$gt": "10" } }), doc));
    }

    #[test]
    fn test_set_and_existence_operators() {
        let doc = json!({ "status": "open" });
        assert!(matches(json!({ "status": { "$in": ["open", "new"] } }), doc.clone()));
        assert!(!matches(json!({ "status": { "$nin": ["open"] } }), doc.clone()));
        assert!(matches(json!({ "status": { "$exists": true } }), doc.clone()));
        assert!(matches(json!({ "owner": { "$exists": false } }), doc.clone()));
        assert!(matches(json!({ "status": { "$ne": "closed" } }), doc.clone()));
        assert!(matches(json!({ "status": { "$not": { "$eq": "closed" } } }), doc));
    }

    #[test]
    fn test_logical_operators() {
        let doc = json!({ "title": "Intro to Python", "year": 2020 });
        assert!(matches(
            json!({ "$or": [{ "title": "nope" }, { "year": 2020 }] }),
            doc.clone()
        ));
        assert!(!matches(
            json!({ "$and": [{ "title": "nope" }, { "year": 2020 }] }),
            doc.clone()
        ));
        assert!(matches(json!({ "$nor": [{ "year": 1999 }] }), doc));
    }

    #[test]
    fn test_case_insensitive_regex() {
        let doc = json!({ "content": "Learning PYTHON the hard way" });
        assert!(matches(
            json!({ "content": { "$regex": "python", "$options": "i" } }),
            doc.clone()
        ));
        assert!(!matches(json!({ "content": { "$regex": "python" } }), doc));
        assert!(!matches(
            json!({ "missing": { "$regex": "python", "$options": "i" } }),
            json!({})
        ));
    }

    #[test]
    fn test_invalid_filters_are_rejected() {
        assert!(matches!(
            compile_err(json!({ "$where": "1" })),
            StoreError::InvalidFilter(_)
        ));
        assert!(matches!(
            compile_err(json!({ "a": { "$near": 1 } })),
            StoreError::InvalidFilter(_)
        ));
        assert!(matches!(
            compile_err(json!({ "a": { "$regex": "(" } })),
            StoreError::InvalidFilter(_)
        ));
        assert!(matches!(
            compile_err(json!({ "a": { "$options": "i" } })),
            StoreError::InvalidFilter(_)
        ));
        assert!(matches!(
            compile_err(json!({ "$or": [] })),
            StoreError::InvalidFilter(_)
        ));
        assert!(matches!(
            compile_err(json!({ "a": { "$in": 3 } })),
            StoreError::InvalidFilter(_)
        ));
        assert!(matches!(
            compile_err(json!({ "a": { "$gt": 1, "b": 2 } })),
            StoreError::InvalidFilter(_)
        ));
        assert!(matches!(
            compile_err(json!({ "a": { "$not": 5 } })),
            StoreError::InvalidFilter(_)
        ));
        assert!(matches!(
            compile_err(json!({ "a": { "$not": { "b": 1 } } })),
            StoreError::InvalidFilter(_)
        ));
        assert!(matches!(
            compile_err(json!({ "a": { "$not": {} } })),
            StoreError::InvalidFilter(_)
        ));
    }
}

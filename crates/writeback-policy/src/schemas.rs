//! JSON Schemas for the built-in action contracts.
//!
//! Schemas describe arguments after normalization, so they only need to
//! accept the canonical structured-query shape.

use serde_json::{Value, json};

fn positive_id() -> Value {
    json!({"type": "integer", "minimum": 1})
}

fn non_empty_object() -> Value {
    json!({"type": "object", "minProperties": 1})
}

fn row(query_required: &[&str], row_key: Option<&str>) -> Value {
    let mut required = vec!["database", "type", "query"];
    let mut properties = json!({
        "database": positive_id(),
        "type": {"const": "query"},
        "query": {
            "type": "object",
            "required": query_required,
            "properties": {
                "sourceTable": positive_id(),
                "filter": {"type": "array", "minItems": 1}
            }
        }
    });
    if let Some(key) = row_key {
        required.push(key);
        properties[key] = non_empty_object();
    }
    json!({
        "type": "object",
        "required": required,
        "properties": properties
    })
}

/// `row/create`: a target table and a non-empty `createRow`.
pub fn row_create() -> Value {
    row(&["sourceTable"], Some("createRow"))
}

/// `row/update`: a target table, a filter and a non-empty `updateRow`.
pub fn row_update() -> Value {
    row(&["sourceTable", "filter"], Some("updateRow"))
}

/// `row/delete`: a target table and a filter.
pub fn row_delete() -> Value {
    row(&["sourceTable", "filter"], None)
}

/// A bulk envelope whose `arg` elements each satisfy `element`.
pub fn bulk(element: Value) -> Value {
    json!({
        "type": "object",
        "required": ["database", "arg"],
        "properties": {
            "database": positive_id(),
            "arg": {"type": "array", "items": element}
        }
    })
}

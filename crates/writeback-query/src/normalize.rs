//! Structured-query documents.
//!
//! A row action's arguments are a structured-query document:
//!
//! ```json
//! {
//!   "database": 2,
//!   "type": "query",
//!   "query": {"sourceTable": 29, "filter": ["=", ["field", 1, null], 5]},
//!   "updateRow": {"name": "Bob"}
//! }
//! ```
//!
//! [`normalize_query`] rewrites legacy shapes into this form and then checks
//! it with [`validate_query`].

use crate::error::{QueryError, describe};
use crate::filter::{Mode, parse_clause};
use serde_json::{Map, Value};

/// Value stamped into `type`.
pub const QUERY_TYPE: &str = "query";

const DOCUMENT_ALIASES: &[(&str, &str)] = &[
    ("database-id", "database"),
    ("database_id", "database"),
    ("create-row", "createRow"),
    ("create_row", "createRow"),
    ("update-row", "updateRow"),
    ("update_row", "updateRow"),
];

const QUERY_ALIASES: &[(&str, &str)] = &[
    ("source-table", "sourceTable"),
    ("source_table", "sourceTable"),
    ("table-id", "sourceTable"),
    ("table_id", "sourceTable"),
];

/// Top-level keys that belong inside `query` when a client omits the wrapper.
const IMPLICIT_QUERY_KEYS: &[&str] = &[
    "sourceTable",
    "source-table",
    "source_table",
    "table-id",
    "table_id",
    "filter",
];

/// Canonicalize a structured-query document.
///
/// Normalizing an already canonical document returns it unchanged.
pub fn normalize_query(raw: Value) -> Result<Value, QueryError> {
    let Value::Object(mut doc) = raw else {
        return Err(QueryError::NotAnObject {
            path: String::new(),
            found: describe(&raw),
        });
    };

    rename_aliases(&mut doc, DOCUMENT_ALIASES, "")?;
    lift_implicit_query(&mut doc)?;

    match doc.get("type") {
        None => {
            doc.insert("type".to_string(), Value::String(QUERY_TYPE.to_string()));
        }
        Some(Value::String(kind)) if kind.eq_ignore_ascii_case(QUERY_TYPE) => {
            doc.insert("type".to_string(), Value::String(QUERY_TYPE.to_string()));
        }
        Some(other) => {
            return Err(QueryError::UnsupportedType {
                path: "/type".to_string(),
                found: describe(other),
            });
        }
    }

    if let Some(database) = doc.get_mut("database") {
        coerce_id(database);
    }

    if let Some(query) = doc.get_mut("query") {
        let Value::Object(query) = query else {
            return Err(QueryError::NotAnObject {
                path: "/query".to_string(),
                found: describe(query),
            });
        };
        rename_aliases(query, QUERY_ALIASES, "/query")?;

        if let Some(table) = query.get_mut("sourceTable") {
            coerce_id(table);
        }

        if let Some(filter) = query.remove("filter") {
            if !is_empty_filter(&filter) {
                let filter = parse_clause(&filter, "/query/filter", Mode::Lenient)?;
                query.insert("filter".to_string(), filter.to_value());
            }
        }
    }

    let doc = Value::Object(doc);
    validate_query(&doc)?;
    Ok(doc)
}

/// Check that a document is a canonical, well-formed structured query.
pub fn validate_query(doc: &Value) -> Result<(), QueryError> {
    let Value::Object(map) = doc else {
        return Err(QueryError::NotAnObject {
            path: String::new(),
            found: describe(doc),
        });
    };
    reject_aliases(map, DOCUMENT_ALIASES, "")?;

    match map.get("type") {
        Some(Value::String(kind)) if kind == QUERY_TYPE => {}
        Some(other) => {
            return Err(QueryError::UnsupportedType {
                path: "/type".to_string(),
                found: describe(other),
            });
        }
        None => {
            return Err(QueryError::UnsupportedType {
                path: "/type".to_string(),
                found: "nothing".to_string(),
            });
        }
    }

    match map.get("query") {
        None => Ok(()),
        Some(Value::Object(query)) => {
            reject_aliases(query, QUERY_ALIASES, "/query")?;
            match query.get("filter") {
                Some(filter) => parse_clause(filter, "/query/filter", Mode::Strict).map(|_| ()),
                None => Ok(()),
            }
        }
        Some(other) => Err(QueryError::NotAnObject {
            path: "/query".to_string(),
            found: describe(other),
        }),
    }
}

/// The filter of a canonical document, if any.
pub fn query_filter(doc: &Value) -> Option<&Value> {
    doc.get("query")?.get("filter")
}

/// The source table of a canonical document, if it is a positive id.
pub fn source_table(doc: &Value) -> Option<u64> {
    doc.get("query")?
        .get("sourceTable")?
        .as_u64()
        .filter(|id| *id > 0)
}

fn rename_aliases(
    map: &mut Map<String, Value>,
    aliases: &[(&str, &str)],
    path: &str,
) -> Result<(), QueryError> {
    for (alias, canonical) in aliases {
        let Some(value) = map.remove(*alias) else {
            continue;
        };
        if map.contains_key(*canonical) {
            return Err(QueryError::DuplicateKey {
                path: path.to_string(),
                alias: alias.to_string(),
                canonical: canonical.to_string(),
            });
        }
        map.insert(canonical.to_string(), value);
    }
    Ok(())
}

fn reject_aliases(
    map: &Map<String, Value>,
    aliases: &[(&str, &str)],
    path: &str,
) -> Result<(), QueryError> {
    match aliases.iter().find(|(alias, _)| map.contains_key(*alias)) {
        Some((alias, canonical)) => Err(QueryError::DuplicateKey {
            path: path.to_string(),
            alias: alias.to_string(),
            canonical: canonical.to_string(),
        }),
        None => Ok(()),
    }
}

fn lift_implicit_query(doc: &mut Map<String, Value>) -> Result<(), QueryError> {
    let lifted: Vec<(String, Value)> = IMPLICIT_QUERY_KEYS
        .iter()
        .filter_map(|key| doc.remove(*key).map(|value| (key.to_string(), value)))
        .collect();
    if lifted.is_empty() {
        return Ok(());
    }

    let query = doc
        .entry("query")
        .or_insert_with(|| Value::Object(Map::new()));
    let Value::Object(query) = query else {
        return Err(QueryError::NotAnObject {
            path: "/query".to_string(),
            found: describe(query),
        });
    };
    for (key, value) in lifted {
        if query.contains_key(&key) {
            return Err(QueryError::DuplicateKey {
                path: String::new(),
                alias: key.clone(),
                canonical: format!("query.{key}"),
            });
        }
        query.insert(key, value);
    }
    Ok(())
}

/// Turn a numeric string id into an integer; anything else is left for the
/// action contract to judge.
fn coerce_id(value: &mut Value) {
    if let Value::String(text) = value {
        if let Ok(id) = text.trim().parse::<u64>() {
            *value = Value::from(id);
        }
    }
}

fn is_empty_filter(filter: &Value) -> bool {
    match filter {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stamps_type_and_keeps_canonical_keys() {
        let doc = normalize_query(json!({
            "database": 2,
            "query": {"sourceTable": 29},
            "createRow": {"name": "Alice"}
        }))
        .unwrap();

        assert_eq!(
            doc,
            json!({
                "database": 2,
                "type": "query",
                "query": {"sourceTable": 29},
                "createRow": {"name": "Alice"}
            })
        );
    }

    #[test]
    fn legacy_aliases_are_renamed() {
        let doc = normalize_query(json!({
            "database-id": "2",
            "type": "QUERY",
            "query": {"source_table": "29", "filter": ["=", 1, 5]},
            "update_row": {"name": "Bob"}
        }))
        .unwrap();

        assert_eq!(
            doc,
            json!({
                "database": 2,
                "type": "query",
                "query": {"sourceTable": 29, "filter": ["=", ["field", 1, null], 5]},
                "updateRow": {"name": "Bob"}
            })
        );
    }

    #[test]
    fn implicit_query_keys_are_wrapped() {
        let doc = normalize_query(json!({
            "database": 2,
            "table-id": 29,
            "filter": ["=", 1, 5]
        }))
        .unwrap();

        assert_eq!(source_table(&doc), Some(29));
        assert_eq!(
            query_filter(&doc),
            Some(&json!(["=", ["field", 1, null], 5]))
        );
        assert!(doc.get("filter").is_none());
    }

    #[test]
    fn empty_filters_are_dropped() {
        for filter in [json!(null), json!([])] {
            let doc = normalize_query(json!({
                "database": 2,
                "query": {"sourceTable": 29, "filter": filter}
            }))
            .unwrap();
            assert_eq!(query_filter(&doc), None);
        }
    }

    #[test]
    fn alias_colliding_with_canonical_key_is_rejected() {
        let err = normalize_query(json!({"database": 1, "database_id": 2})).unwrap_err();
        assert!(matches!(err, QueryError::DuplicateKey { .. }));

        let err = normalize_query(json!({
            "database": 1,
            "sourceTable": 3,
            "query": {"sourceTable": 4}
        }))
        .unwrap_err();
        assert!(matches!(err, QueryError::DuplicateKey { .. }));
    }

    #[test]
    fn other_query_types_are_rejected() {
        let err = normalize_query(json!({"database": 1, "type": "native"})).unwrap_err();
        assert_eq!(err.path(), "/type");
    }

    #[test]
    fn non_objects_are_rejected() {
        assert!(matches!(
            normalize_query(json!([1, 2])),
            Err(QueryError::NotAnObject { .. })
        ));
        let err = normalize_query(json!({"database": 1, "query": 7})).unwrap_err();
        assert_eq!(err.path(), "/query");
    }

    #[test]
    fn filter_errors_carry_document_paths() {
        let err = normalize_query(json!({
            "database": 1,
            "query": {"sourceTable": 2, "filter": ["and", ["=", 1, 1], ["between", 1, 2]]}
        }))
        .unwrap_err();
        assert_eq!(err.path(), "/query/filter/2");
    }

    #[test]
    fn normalization_is_idempotent() {
        let raw = json!({
            "database_id": "7",
            "source-table": 3,
            "filter": ["AND", ["not-null", ["field-id", 4]], ["and", ["=", 2, "x"]]],
            "create-row": {"a": 1},
            "extra": true
        });
        let once = normalize_query(raw).unwrap();
        let twice = normalize_query(once.clone()).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once["extra"], json!(true));
    }

    #[test]
    fn invalid_ids_are_left_for_contracts() {
        let doc = normalize_query(json!({"database": "abc", "query": {"sourceTable": -4}})).unwrap();
        assert_eq!(doc["database"], json!("abc"));
        assert_eq!(source_table(&doc), None);
    }

    #[test]
    fn validate_rejects_non_canonical_documents() {
        assert!(validate_query(&json!({"database": 1})).is_err());
        assert!(validate_query(&json!({"type": "query", "database_id": 1})).is_err());
        assert!(
            validate_query(&json!({"type": "query", "query": {"filter": ["=", 1, 2]}})).is_err()
        );
        assert!(validate_query(&json!({"type": "query", "query": {"sourceTable": 1}})).is_ok());
    }
}

//! Argument normalizers.
//!
//! Normalization runs before contract validation and turns the argument
//! shapes clients actually send into the one canonical shape contracts and
//! handlers expect. Every normalizer is idempotent.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use writeback_core::{ActionFamily, ActionName};
use writeback_policy::{STRUCTURED_QUERY, ValidationFailure};
use writeback_query::{QueryError, normalize_query};

/// Rewrites raw arguments into canonical form.
pub trait ArgNormalizer: Send + Sync {
    fn normalize(&self, raw: Value) -> Result<Value, ValidationFailure>;
}

/// Row family: the arguments are one structured-query document.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowQueryNormalizer;

impl ArgNormalizer for RowQueryNormalizer {
    fn normalize(&self, raw: Value) -> Result<Value, ValidationFailure> {
        Ok(normalize_query(raw)?)
    }
}

/// Bulk family: a batch of row documents against a single database.
///
/// Accepts a bare array of row maps or an envelope `{database, arg}` and
/// always produces the envelope. The envelope's database is copied into
/// rows that do not name one; rows naming a different database are
/// rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct BulkNormalizer;

const DATABASE: &str = "database";
const DATABASE_ALIASES: [&str; 3] = ["database", "database-id", "database_id"];

impl ArgNormalizer for BulkNormalizer {
    fn normalize(&self, raw: Value) -> Result<Value, ValidationFailure> {
        let (database, rows) = match raw {
            Value::Array(rows) => (None, rows),
            Value::Object(mut envelope) => {
                let rows = match envelope.remove("arg") {
                    Some(Value::Array(rows)) => rows,
                    Some(other) => {
                        return Err(ValidationFailure::single(
                            STRUCTURED_QUERY,
                            "/arg",
                            format!("expected an array of row maps, got {other}"),
                        ));
                    }
                    None => {
                        return Err(ValidationFailure::single(
                            STRUCTURED_QUERY,
                            "",
                            "expected an array of row maps under 'arg'",
                        ));
                    }
                };
                (take_database(&mut envelope)?, rows)
            }
            other => {
                return Err(ValidationFailure::single(
                    STRUCTURED_QUERY,
                    "",
                    format!("expected an array of row maps, got {other}"),
                ));
            }
        };

        let database = database.or_else(|| rows.iter().find_map(row_database));

        let mut normalized = Vec::with_capacity(rows.len());
        for (index, row) in rows.into_iter().enumerate() {
            let row = match (row, &database) {
                (Value::Object(mut map), Some(db)) if row_database_key(&map).is_none() => {
                    map.insert(DATABASE.to_string(), db.clone());
                    Value::Object(map)
                }
                (row, _) => row,
            };
            let row = normalize_query(row).map_err(|err| in_row(index, &err))?;

            if let (Some(row_db), Some(db)) = (row.get(DATABASE), &database) {
                if row_db != db {
                    return Err(ValidationFailure::single(
                        STRUCTURED_QUERY,
                        format!("/arg/{index}/database"),
                        format!("database {row_db} does not match the batch database {db}"),
                    ));
                }
            }
            normalized.push(row);
        }

        let mut envelope = Map::new();
        if let Some(database) = database {
            envelope.insert(DATABASE.to_string(), database);
        }
        envelope.insert("arg".to_string(), Value::Array(normalized));
        Ok(Value::Object(envelope))
    }
}

fn row_database_key(row: &Map<String, Value>) -> Option<&'static str> {
    DATABASE_ALIASES.into_iter().find(|key| row.contains_key(*key))
}

/// The database a raw row names, under any alias.
fn row_database(row: &Value) -> Option<Value> {
    let row = row.as_object()?;
    let key = row_database_key(row)?;
    row.get(key).cloned().map(coerce_id)
}

fn take_database(envelope: &mut Map<String, Value>) -> Result<Option<Value>, ValidationFailure> {
    let mut found: Option<(&str, Value)> = None;
    for key in DATABASE_ALIASES {
        let Some(value) = envelope.remove(key) else {
            continue;
        };
        if let Some((first, _)) = &found {
            return Err(ValidationFailure::single(
                STRUCTURED_QUERY,
                "",
                format!("both '{first}' and '{key}' are present"),
            ));
        }
        found = Some((key, coerce_id(value)));
    }
    Ok(found.map(|(_, value)| value))
}

fn coerce_id(value: Value) -> Value {
    if let Value::String(text) = &value {
        if let Ok(id) = text.trim().parse::<u64>() {
            return Value::from(id);
        }
    }
    value
}

fn in_row(index: usize, err: &QueryError) -> ValidationFailure {
    ValidationFailure::single(
        STRUCTURED_QUERY,
        format!("/arg/{index}{}", err.path()),
        err.to_string(),
    )
}

/// Normalizers by action, with per-family defaults.
#[derive(Clone, Default)]
pub struct NormalizerRegistry {
    by_action: HashMap<ActionName, Arc<dyn ArgNormalizer>>,
    by_family: HashMap<ActionFamily, Arc<dyn ArgNormalizer>>,
}

impl NormalizerRegistry {
    /// No normalizers; every action's arguments pass through unchanged.
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizers for the `row` and `bulk` families.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register_family(ActionFamily::Row, RowQueryNormalizer);
        registry.register_family(ActionFamily::Bulk, BulkNormalizer);
        registry
    }

    /// Normalizer for one action, taking precedence over its family's.
    pub fn register<N: ArgNormalizer + 'static>(&mut self, action: ActionName, normalizer: N) {
        self.by_action.insert(action, Arc::new(normalizer));
    }

    pub fn register_family<N: ArgNormalizer + 'static>(
        &mut self,
        family: ActionFamily,
        normalizer: N,
    ) {
        self.by_family.insert(family, Arc::new(normalizer));
    }

    pub fn normalizer_for(&self, action: &ActionName) -> Option<Arc<dyn ArgNormalizer>> {
        self.by_action
            .get(action)
            .or_else(|| action.family().and_then(|family| self.by_family.get(&family)))
            .cloned()
    }

    /// Normalize `raw` for `action`; identity when no normalizer applies.
    pub fn normalize(&self, action: &ActionName, raw: Value) -> Result<Value, ValidationFailure> {
        match self.normalizer_for(action) {
            Some(normalizer) => normalizer.normalize(raw),
            None => Ok(raw),
        }
    }
}

//! Handlers for the built-in row and bulk actions.

use crate::error::MemoryError;
use crate::tables::{MemoryTables, RowOp};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use writeback_core::{ActionFamily, ActionName, ConnectorKind};
use writeback_query::{Clause, query_filter, source_table};
use writeback_runtime::{
    ActionContext, ActionError, ActionHandler, ActionRegistry, ActionRequest,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Create,
    Update,
    Delete,
}

impl Verb {
    fn parse(verb: &str) -> Option<Self> {
        match verb {
            "create" => Some(Verb::Create),
            "update" => Some(Verb::Update),
            "delete" => Some(Verb::Delete),
            _ => None,
        }
    }

    fn parse_op(self, args: &Value) -> Result<RowOp, MemoryError> {
        let table = source_table(args)
            .ok_or_else(|| MemoryError::InvalidArguments("missing query.sourceTable".to_string()))?;
        match self {
            Verb::Create => Ok(RowOp::Create {
                table,
                row: object(args, "createRow")?,
            }),
            Verb::Update => Ok(RowOp::Update {
                table,
                filter: filter(args)?,
                changes: object(args, "updateRow")?,
            }),
            Verb::Delete => Ok(RowOp::Delete {
                table,
                filter: filter(args)?,
            }),
        }
    }
}

fn object(args: &Value, key: &str) -> Result<Map<String, Value>, MemoryError> {
    match args.get(key) {
        Some(Value::Object(map)) => Ok(map.clone()),
        _ => Err(MemoryError::InvalidArguments(format!(
            "'{key}' must be an object"
        ))),
    }
}

fn filter(args: &Value) -> Result<Clause, MemoryError> {
    let filter = query_filter(args)
        .ok_or_else(|| MemoryError::InvalidArguments("missing query.filter".to_string()))?;
    Clause::parse_canonical(filter).map_err(|e| MemoryError::InvalidArguments(e.to_string()))
}

/// `row/*` against one table.
struct RowHandler {
    tables: Arc<MemoryTables>,
    verb: Verb,
}

#[async_trait]
impl ActionHandler for RowHandler {
    async fn handle(
        &self,
        _ctx: &ActionContext,
        request: ActionRequest<'_>,
    ) -> Result<Value, ActionError> {
        let database = request.resource.id;
        let op = self.verb.parse_op(&request.args)?;
        let row = self.tables.apply(database, &op).await?;

        tracing::debug!(
            connector = %request.connector,
            database,
            table = op.table(),
            verb = ?self.verb,
            "row action applied"
        );
        Ok(match self.verb {
            Verb::Create => json!({"created-row": row}),
            Verb::Update => json!({"rows-updated": 1}),
            Verb::Delete => json!({"rows-deleted": 1}),
        })
    }
}

/// `bulk/*`: every element is checked against the current state before any
/// change is kept.
struct BulkHandler {
    tables: Arc<MemoryTables>,
    verb: Verb,
}

#[async_trait]
impl ActionHandler for BulkHandler {
    async fn handle(
        &self,
        _ctx: &ActionContext,
        request: ActionRequest<'_>,
    ) -> Result<Value, ActionError> {
        let database = request.resource.id;
        let rows = request
            .args
            .get("arg")
            .and_then(Value::as_array)
            .ok_or_else(|| MemoryError::InvalidArguments("'arg' must be an array".to_string()))?;

        let ops = rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                self.verb.parse_op(row).map_err(|source| MemoryError::InBatch {
                    index,
                    source: Box::new(source),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let counts = self.tables.apply_batch(database, &ops).await?;
        tracing::debug!(
            connector = %request.connector,
            database,
            rows = ops.len(),
            verb = ?self.verb,
            "bulk action applied"
        );

        Ok(match self.verb {
            Verb::Create => json!({"success": true, "rows-created": counts.created}),
            Verb::Update => json!({"success": true, "rows-updated": counts.updated}),
            Verb::Delete => json!({"success": true, "rows-deleted": counts.deleted}),
        })
    }
}

/// Register handlers for all six built-in actions under `kind`.
///
/// Registering under an abstract kind such as `sql-jdbc` serves every
/// descendant through the hierarchy.
pub fn register_memory_handlers(
    registry: &mut ActionRegistry,
    kind: ConnectorKind,
    tables: Arc<MemoryTables>,
) {
    for action in ActionName::BUILTIN {
        let Some(verb) = Verb::parse(action.verb()) else {
            continue;
        };
        let tables = Arc::clone(&tables);
        match action.family() {
            Some(ActionFamily::Row) => registry.register(kind, action, RowHandler { tables, verb }),
            Some(ActionFamily::Bulk) => registry.register(kind, action, BulkHandler { tables, verb }),
            None => {}
        }
    }
}

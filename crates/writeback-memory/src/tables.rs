//! In-memory tables.
//!
//! Tables are keyed by `(database, sourceTable)` and guarded by one
//! `tokio::sync::RwLock`. Batches run against a scratch copy of the
//! database's tables and are committed only if every row succeeds.

use crate::error::MemoryError;
use crate::eval;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use writeback_core::{TableSeed, WritebackConfig};
use writeback_query::{Clause, FieldId, FieldRef};

/// One table: named columns, rows as JSON maps.
#[derive(Debug, Clone)]
pub struct Table {
    pub id: u64,
    pub name: String,
    pub primary_key: String,
    pub fields: BTreeMap<u64, String>,
    pub rows: Vec<Map<String, Value>>,
    /// Next auto-assigned key; `None` once `u64::MAX` is taken.
    next_id: Option<u64>,
}

impl Table {
    pub fn from_seed(seed: &TableSeed) -> Self {
        let mut table = Self {
            id: seed.id,
            name: seed.name.clone(),
            primary_key: seed.primary_key.clone(),
            fields: seed.fields.clone(),
            rows: seed.rows.clone(),
            next_id: Some(1),
        };
        table.next_id = table.max_key().checked_add(1);
        table
    }

    fn max_key(&self) -> u64 {
        self.rows
            .iter()
            .filter_map(|row| row.get(&self.primary_key)?.as_u64())
            .max()
            .unwrap_or(0)
    }

    /// Column a field reference points at.
    pub fn column_for<'a>(&'a self, field: &'a FieldRef) -> Result<&'a str, MemoryError> {
        match &field.id {
            FieldId::Name(name) => Ok(name.as_str()),
            FieldId::Id(id) => self
                .fields
                .get(id)
                .map(String::as_str)
                .ok_or_else(|| MemoryError::UnknownField {
                    table: self.name.clone(),
                    field: *id,
                }),
        }
    }

    /// Indexes of the rows matching `filter`.
    fn matching(&self, filter: &Clause) -> Result<Vec<usize>, MemoryError> {
        let mut hits = Vec::new();
        for (index, row) in self.rows.iter().enumerate() {
            if eval::matches(filter, row, self)? {
                hits.push(index);
            }
        }
        Ok(hits)
    }

    /// The single row matching `filter`.
    fn only_match(&self, filter: &Clause) -> Result<usize, MemoryError> {
        match self.matching(filter)?.as_slice() {
            [index] => Ok(*index),
            hits => Err(MemoryError::WrongRowCount { count: hits.len() }),
        }
    }

    fn insert(&mut self, mut row: Map<String, Value>) -> Result<Map<String, Value>, MemoryError> {
        match row.get(&self.primary_key) {
            None | Some(Value::Null) => {
                let id = self.next_id.ok_or_else(|| MemoryError::KeysExhausted {
                    table: self.name.clone(),
                })?;
                row.insert(self.primary_key.clone(), Value::from(id));
            }
            Some(key) => {
                if self
                    .rows
                    .iter()
                    .any(|existing| existing.get(&self.primary_key) == Some(key))
                {
                    return Err(MemoryError::DuplicateKey {
                        table: self.name.clone(),
                        column: self.primary_key.clone(),
                        value: key.to_string(),
                    });
                }
            }
        }
        if let Some(key) = row.get(&self.primary_key).and_then(Value::as_u64) {
            self.next_id = match key.checked_add(1) {
                Some(next) => self.next_id.map(|current| current.max(next)),
                None => None,
            };
        }
        self.rows.push(row.clone());
        Ok(row)
    }

    fn apply(&mut self, op: &RowOp) -> Result<Value, MemoryError> {
        let row = match op {
            RowOp::Create { row, .. } => self.insert(row.clone()),
            RowOp::Update {
                filter, changes, ..
            } => {
                let index = self.only_match(filter)?;
                let target = &mut self.rows[index];
                for (column, value) in changes {
                    target.insert(column.clone(), value.clone());
                }
                Ok(target.clone())
            }
            RowOp::Delete { filter, .. } => {
                let index = self.only_match(filter)?;
                Ok(self.rows.remove(index))
            }
        }?;
        Ok(Value::Object(row))
    }
}

/// One single-row mutation.
#[derive(Debug, Clone)]
pub enum RowOp {
    Create {
        table: u64,
        row: Map<String, Value>,
    },
    Update {
        table: u64,
        filter: Clause,
        changes: Map<String, Value>,
    },
    Delete {
        table: u64,
        filter: Clause,
    },
}

impl RowOp {
    pub fn table(&self) -> u64 {
        match self {
            RowOp::Create { table, .. }
            | RowOp::Update { table, .. }
            | RowOp::Delete { table, .. } => *table,
        }
    }
}

/// Row counts of an applied batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchCounts {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
}

/// Every in-memory table, across databases.
#[derive(Debug, Default)]
pub struct MemoryTables {
    tables: RwLock<HashMap<(u64, u64), Table>>,
}

impl MemoryTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tables seeded from every configured resource.
    pub fn from_config(config: &WritebackConfig) -> Self {
        let tables = config
            .resources
            .iter()
            .flat_map(|resource| {
                resource
                    .tables
                    .iter()
                    .map(move |seed| ((resource.id, seed.id), Table::from_seed(seed)))
            })
            .collect();
        Self {
            tables: RwLock::new(tables),
        }
    }

    /// Add or replace a table.
    pub async fn insert_table(&self, database: u64, table: Table) {
        self.tables.write().await.insert((database, table.id), table);
    }

    /// Snapshot of a table's rows.
    pub async fn rows(&self, database: u64, table: u64) -> Option<Vec<Map<String, Value>>> {
        let tables = self.tables.read().await;
        tables.get(&(database, table)).map(|t| t.rows.clone())
    }

    /// Apply one mutation, returning the affected row.
    pub async fn apply(&self, database: u64, op: &RowOp) -> Result<Value, MemoryError> {
        let mut tables = self.tables.write().await;
        let table = tables
            .get_mut(&(database, op.table()))
            .ok_or(MemoryError::TableNotFound {
                database,
                table: op.table(),
            })?;
        table.apply(op)
    }

    /// Apply a batch all-or-nothing.
    pub async fn apply_batch(&self, database: u64, ops: &[RowOp]) -> Result<BatchCounts, MemoryError> {
        let mut tables = self.tables.write().await;

        let mut scratch: HashMap<u64, Table> = tables
            .iter()
            .filter(|((db, _), _)| *db == database)
            .map(|((_, id), table)| (*id, table.clone()))
            .collect();

        let mut counts = BatchCounts::default();
        for (index, op) in ops.iter().enumerate() {
            let in_batch = |source: MemoryError| MemoryError::InBatch {
                index,
                source: Box::new(source),
            };
            let table = scratch.get_mut(&op.table()).ok_or_else(|| {
                in_batch(MemoryError::TableNotFound {
                    database,
                    table: op.table(),
                })
            })?;
            table.apply(op).map_err(in_batch)?;
            match op {
                RowOp::Create { .. } => counts.created += 1,
                RowOp::Update { .. } => counts.updated += 1,
                RowOp::Delete { .. } => counts.deleted += 1,
            }
        }

        for (id, table) in scratch {
            tables.insert((database, id), table);
        }
        Ok(counts)
    }
}

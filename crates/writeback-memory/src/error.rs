//! Error types for the in-memory connector.

use thiserror::Error;
use writeback_runtime::{ActionError, HandlerError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("Table {table} does not exist in database {database}.")]
    TableNotFound { database: u64, table: u64 },

    #[error("Field {field} does not exist in table '{table}'.")]
    UnknownField { table: String, field: u64 },

    #[error("would affect {count} rows, but you can only act on 1")]
    WrongRowCount { count: usize },

    #[error("a row with {column} = {value} already exists in table '{table}'")]
    DuplicateKey {
        table: String,
        column: String,
        value: String,
    },

    #[error("table '{table}' has no primary key values left to assign")]
    KeysExhausted { table: String },

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// A batch element failed; nothing in the batch was applied.
    #[error("row {index} of the batch failed: {source}")]
    InBatch {
        index: usize,
        #[source]
        source: Box<MemoryError>,
    },
}

impl MemoryError {
    pub fn status_code(&self) -> u16 {
        match self {
            MemoryError::TableNotFound { .. } => 404,
            MemoryError::InBatch { source, .. } => source.status_code(),
            _ => 400,
        }
    }
}

impl From<MemoryError> for HandlerError {
    fn from(err: MemoryError) -> Self {
        let status = err.status_code();
        let handler = HandlerError::new(err.to_string()).with_status(status);
        match &err {
            MemoryError::InBatch { index, .. } => {
                handler.with_details(serde_json::json!({"index": index}))
            }
            _ => handler,
        }
    }
}

impl From<MemoryError> for ActionError {
    fn from(err: MemoryError) -> Self {
        ActionError::Handler(err.into())
    }
}

//! Error types for the query crate.

use thiserror::Error;

/// A structured-query grammar violation.
///
/// Every variant carries the JSON pointer of the offending value, so the
/// caller can report `path` and `message` separately.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// A value that must be an object is something else.
    #[error("expected an object, got {found}")]
    NotAnObject { path: String, found: String },

    /// A legacy alias and its canonical key are both present.
    #[error("both '{alias}' and '{canonical}' are present")]
    DuplicateKey {
        path: String,
        alias: String,
        canonical: String,
    },

    /// `type` names something other than a structured query.
    #[error("unsupported query type {found}")]
    UnsupportedType { path: String, found: String },

    /// A filter clause is not a non-empty array headed by an operator.
    #[error("expected a filter clause, got {found}")]
    NotAClause { path: String, found: String },

    /// The clause operator is not part of the grammar.
    #[error("unknown filter operator '{operator}'")]
    UnknownOperator { path: String, operator: String },

    /// The clause has the wrong number of arguments.
    #[error("'{operator}' expects {expected}, got {found}")]
    Arity {
        path: String,
        operator: String,
        expected: &'static str,
        found: usize,
    },

    /// A field reference is malformed.
    #[error("invalid field reference {found}")]
    InvalidFieldRef { path: String, found: String },

    /// A comparison value is not acceptable for its operator.
    #[error("invalid value {found}: {reason}")]
    InvalidValue {
        path: String,
        found: String,
        reason: &'static str,
    },
}

impl QueryError {
    /// JSON pointer of the offending value (empty for the document root).
    pub fn path(&self) -> &str {
        match self {
            QueryError::NotAnObject { path, .. }
            | QueryError::DuplicateKey { path, .. }
            | QueryError::UnsupportedType { path, .. }
            | QueryError::NotAClause { path, .. }
            | QueryError::UnknownOperator { path, .. }
            | QueryError::Arity { path, .. }
            | QueryError::InvalidFieldRef { path, .. }
            | QueryError::InvalidValue { path, .. } => path,
        }
    }
}

/// Short rendering of a JSON value for error messages.
pub(crate) fn describe(value: &serde_json::Value) -> String {
    const LIMIT: usize = 60;
    let rendered = value.to_string();
    if rendered.chars().count() > LIMIT {
        let head: String = rendered.chars().take(LIMIT).collect();
        format!("{head}...")
    } else {
        rendered
    }
}

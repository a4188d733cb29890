//! Error types for contract validation and the enablement gate.

use serde::Serialize;
use thiserror::Error;
use writeback_core::{ConnectorKind, Feature};
use writeback_query::QueryError;

/// Contract name reported for structured-query grammar violations.
pub const STRUCTURED_QUERY: &str = "structured-query";

/// Contract name reported when arguments do not name a target resource.
pub const TARGET_RESOURCE: &str = "target-resource";

/// One violated constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// JSON pointer into the arguments; empty for the root.
    pub path: String,
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Arguments failed a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("arguments do not satisfy the '{contract}' contract: {}", summarize(.violations))]
pub struct ValidationFailure {
    /// Name of the failed contract.
    pub contract: String,
    /// Every violated constraint, in the order found.
    pub violations: Vec<Violation>,
}

impl ValidationFailure {
    pub fn new(contract: impl Into<String>, violations: Vec<Violation>) -> Self {
        Self {
            contract: contract.into(),
            violations,
        }
    }

    /// A failure with a single violation.
    pub fn single(
        contract: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(contract, vec![Violation::new(path, message)])
    }
}

impl From<QueryError> for ValidationFailure {
    fn from(err: QueryError) -> Self {
        Self::single(STRUCTURED_QUERY, err.path(), err.to_string())
    }
}

fn summarize(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| {
            if v.path.is_empty() {
                v.message.clone()
            } else {
                format!("{}: {}", v.path, v.message)
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// A contract schema that does not compile.
#[derive(Debug, Clone, Error)]
#[error("contract '{name}' failed to compile: {message}")]
pub struct ContractError {
    pub name: String,
    pub message: String,
}

/// Reasons the enablement gate refuses an action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    /// Actions are switched off process-wide.
    #[error("Actions are not enabled.")]
    FeatureDisabled,

    /// The resource's connector does not declare the required feature.
    #[error("{connector} does not support {action} (feature '{feature}') for database {resource}.")]
    UnsupportedConnector {
        connector: ConnectorKind,
        action: String,
        feature: Feature,
        resource_id: u64,
        resource: String,
    },

    /// Actions are switched off for this resource.
    #[error("Actions are not enabled for database {resource}.")]
    DisabledForResource { resource_id: u64, resource: String },

    /// The caller may not perform actions.
    #[error("You don't have permissions to do that.")]
    Unauthorized { caller: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_errors_become_structured_query_failures() {
        let err = QueryError::UnsupportedType {
            path: "/type".to_string(),
            found: "\"native\"".to_string(),
        };
        let failure = ValidationFailure::from(err);
        assert_eq!(failure.contract, STRUCTURED_QUERY);
        assert_eq!(failure.violations[0].path, "/type");
    }

    #[test]
    fn failures_serialize_with_every_violation() {
        let failure = ValidationFailure::new(
            "row/update",
            vec![
                Violation::new("/query", "\"filter\" is a required property"),
                Violation::new("", "\"updateRow\" is a required property"),
            ],
        );
        assert_eq!(
            serde_json::to_value(&failure).unwrap(),
            json!({
                "contract": "row/update",
                "violations": [
                    {"path": "/query", "message": "\"filter\" is a required property"},
                    {"path": "", "message": "\"updateRow\" is a required property"}
                ]
            })
        );
        assert!(failure.to_string().contains("/query: \"filter\""));
    }
}

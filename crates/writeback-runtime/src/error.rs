//! Error types for action dispatch.

use serde::Serialize;
use serde_json::{Value, json};
use std::fmt;
use thiserror::Error;
use writeback_core::ConnectorKind;
use writeback_policy::{GateError, ValidationFailure};

/// Failure classes exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    Disabled,
    Unsupported,
    NotFound,
    Validation,
    Unauthorized,
    HandlerError,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Disabled => "disabled",
            ErrorKind::Unsupported => "unsupported",
            ErrorKind::NotFound => "not-found",
            ErrorKind::Validation => "validation",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::HandlerError => "handler-error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error raised by a handler, passed to the caller unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("{message}")]
pub struct HandlerError {
    pub message: String,
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl HandlerError {
    /// A handler error with status 500.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: 500,
            details: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(message).with_status(400)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(message).with_status(404)
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Everything that can go wrong while performing an action.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The enablement gate refused the call.
    #[error(transparent)]
    Gate(#[from] GateError),

    /// No handler is registered for this action under any connector kind.
    #[error("Unknown action '{action}'.")]
    UnknownAction { action: String },

    /// The action is known, but not for this connector kind.
    #[error("{action} is not supported for {connector} databases.")]
    UnsupportedConnector {
        connector: ConnectorKind,
        action: String,
    },

    /// Arguments failed normalization or their contract.
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    /// The target resource does not exist.
    #[error("Database {id} does not exist.")]
    NotFound { id: u64 },

    /// The resource store failed.
    #[error("failed to look up database {id}")]
    ResourceLookup {
        id: u64,
        #[source]
        source: anyhow::Error,
    },

    /// The handler failed.
    #[error(transparent)]
    Handler(#[from] HandlerError),
}

impl ActionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ActionError::Gate(GateError::FeatureDisabled)
            | ActionError::Gate(GateError::DisabledForResource { .. }) => ErrorKind::Disabled,
            ActionError::Gate(GateError::UnsupportedConnector { .. })
            | ActionError::UnsupportedConnector { .. } => ErrorKind::Unsupported,
            ActionError::Gate(GateError::Unauthorized { .. }) => ErrorKind::Unauthorized,
            ActionError::UnknownAction { .. } | ActionError::NotFound { .. } => ErrorKind::NotFound,
            ActionError::Validation(_) => ErrorKind::Validation,
            ActionError::ResourceLookup { .. } | ActionError::Handler(_) => ErrorKind::HandlerError,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ActionError::Handler(err) => err.status_code,
            ActionError::ResourceLookup { .. } => 500,
            _ => match self.kind() {
                ErrorKind::Unauthorized => 403,
                ErrorKind::NotFound => 404,
                ErrorKind::HandlerError => 500,
                ErrorKind::Disabled | ErrorKind::Unsupported | ErrorKind::Validation => 400,
            },
        }
    }

    /// Structured detail for the caller, if the error carries any.
    pub fn details(&self) -> Option<Value> {
        match self {
            ActionError::Validation(failure) => serde_json::to_value(failure).ok(),
            ActionError::Handler(err) => err.details.clone(),
            ActionError::Gate(GateError::UnsupportedConnector {
                connector,
                feature,
                resource_id,
                ..
            }) => Some(json!({
                "connector": connector,
                "feature": feature,
                "database": resource_id,
            })),
            ActionError::Gate(GateError::DisabledForResource { resource_id, .. }) => {
                Some(json!({"database": resource_id}))
            }
            ActionError::UnsupportedConnector { connector, .. } => {
                Some(json!({"connector": connector}))
            }
            ActionError::ResourceLookup { source, .. } => {
                Some(json!({"cause": format!("{source:#}")}))
            }
            _ => None,
        }
    }

    /// The caller-facing form of this error.
    pub fn to_failure(&self) -> ActionFailure {
        ActionFailure {
            kind: self.kind(),
            message: self.to_string(),
            status_code: self.status_code(),
            details: self.details(),
        }
    }
}

/// The failure shape returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionFailure {
    pub kind: ErrorKind,
    pub message: String,
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl From<&ActionError> for ActionFailure {
    fn from(err: &ActionError) -> Self {
        err.to_failure()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use writeback_core::Feature;

    #[test]
    fn status_codes_follow_the_kind() {
        let cases: Vec<(ActionError, ErrorKind, u16)> = vec![
            (GateError::FeatureDisabled.into(), ErrorKind::Disabled, 400),
            (
                GateError::Unauthorized {
                    caller: "rasta".to_string(),
                }
                .into(),
                ErrorKind::Unauthorized,
                403,
            ),
            (
                ActionError::UnknownAction {
                    action: "row/nope".to_string(),
                },
                ErrorKind::NotFound,
                404,
            ),
            (ActionError::NotFound { id: 9 }, ErrorKind::NotFound, 404),
            (
                ValidationFailure::single("row/create", "", "bad").into(),
                ErrorKind::Validation,
                400,
            ),
            (
                ActionError::ResourceLookup {
                    id: 1,
                    source: anyhow::anyhow!("connection refused"),
                },
                ErrorKind::HandlerError,
                500,
            ),
        ];
        for (err, kind, status) in cases {
            assert_eq!(err.kind(), kind, "{err}");
            assert_eq!(err.status_code(), status, "{err}");
        }
    }

    #[test]
    fn handler_errors_keep_their_status_and_details() {
        let err = ActionError::from(
            HandlerError::bad_request("would affect 2 rows").with_details(json!({"rows": 2})),
        );
        let failure = err.to_failure();
        assert_eq!(failure.kind, ErrorKind::HandlerError);
        assert_eq!(failure.status_code, 400);
        assert_eq!(failure.message, "would affect 2 rows");
        assert_eq!(failure.details, Some(json!({"rows": 2})));
    }

    #[test]
    fn failures_serialize_with_kebab_case_kinds() {
        let err = ActionError::from(GateError::UnsupportedConnector {
            connector: ConnectorKind::Redshift,
            action: "row/create".to_string(),
            feature: Feature::Actions,
            resource_id: 3,
            resource: "#3".to_string(),
        });
        let value = serde_json::to_value(err.to_failure()).unwrap();
        assert_eq!(value["kind"], json!("unsupported"));
        assert_eq!(value["status_code"], json!(400));
        assert_eq!(value["details"]["connector"], json!("redshift"));
        assert_eq!(value["details"]["feature"], json!("actions"));
    }
}

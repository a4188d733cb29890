use crate::error::ErrorKind;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;
use writeback_core::ConnectorKind;

/// How an invocation ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum Outcome {
    Succeeded,
    Failed { kind: ErrorKind, status_code: u16 },
}

/// One record per `perform_action` call.
#[derive(Debug, Clone, Serialize)]
pub struct ActionEvent {
    pub request_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub action: String,
    /// Unset when the call failed before a resource was identified.
    pub resource_id: Option<u64>,
    pub connector: Option<ConnectorKind>,
    pub caller_id: Option<String>,
    pub outcome: Outcome,
}

/// Receives audit events. Implementations must not block for long; they
/// run on the dispatching task.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: ActionEvent);
}

/// Writes events to the `writeback::audit` tracing target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: ActionEvent) {
        let (status, kind, status_code) = match &event.outcome {
            Outcome::Succeeded => ("succeeded", None, None),
            Outcome::Failed { kind, status_code } => ("failed", Some(kind.as_str()), Some(*status_code)),
        };
        tracing::info!(
            target: "writeback::audit",
            request_id = %event.request_id,
            occurred_at = %event.occurred_at.to_rfc3339(),
            action = %event.action,
            resource_id = event.resource_id,
            connector = event.connector.map(|c| c.as_str()),
            caller_id = event.caller_id.as_deref(),
            status,
            kind,
            status_code,
            "action audited"
        );
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&self, _event: ActionEvent) {}
}

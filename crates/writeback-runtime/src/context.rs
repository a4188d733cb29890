use uuid::Uuid;
use writeback_core::{Caller, ScopedSettings};

/// Per-call state handed to handlers.
///
/// Owned by exactly one invocation and dropped when it returns.
#[derive(Debug, Clone)]
pub struct ActionContext {
    /// Correlates log lines and the audit event of one call.
    pub request_id: Uuid,
    /// Process settings with the target resource's overrides applied.
    pub settings: ScopedSettings,
    pub caller: Option<Caller>,
}

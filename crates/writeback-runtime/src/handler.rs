//! The handler boundary.

use crate::context::ActionContext;
use crate::error::ActionError;
use async_trait::async_trait;
use serde_json::Value;
use writeback_core::{ActionName, ConnectorKind, Resource};

/// One action invocation as seen by its handler.
#[derive(Debug, Clone)]
pub struct ActionRequest<'a> {
    /// Kind the handler was resolved for: the resource's engine.
    pub connector: ConnectorKind,
    pub action: &'a ActionName,
    pub resource: &'a Resource,
    /// Normalized arguments that already satisfy the action's contract.
    pub args: Value,
}

/// Executes one action against one connector kind.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn handle(
        &self,
        ctx: &ActionContext,
        request: ActionRequest<'_>,
    ) -> Result<Value, ActionError>;
}

/// Handler used when no registration matches.
///
/// Distinguishes an action nobody implements from one that only other
/// connector kinds implement.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Unhandled {
    pub(crate) known: bool,
}

#[async_trait]
impl ActionHandler for Unhandled {
    async fn handle(
        &self,
        _ctx: &ActionContext,
        request: ActionRequest<'_>,
    ) -> Result<Value, ActionError> {
        if self.known {
            Err(ActionError::UnsupportedConnector {
                connector: request.connector,
                action: request.action.to_string(),
            })
        } else {
            Err(ActionError::UnknownAction {
                action: request.action.to_string(),
            })
        }
    }
}

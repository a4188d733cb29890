//! The action dispatcher.
//!
//! `perform_action` runs one invocation end to end:
//!
//! 1. reject actions no connector implements,
//! 2. normalize the raw arguments,
//! 3. validate them against the action's contract,
//! 4. load the target resource named by `database`,
//! 5. run the enablement gate with settings scoped to that resource,
//! 6. resolve and invoke the handler.
//!
//! Every call emits exactly one audit event, whatever its outcome.

use crate::adapter::ResourceStore;
use crate::audit::{ActionEvent, AuditSink, Outcome, TracingAuditSink};
use crate::context::ActionContext;
use crate::error::ActionError;
use crate::handler::ActionRequest;
use crate::normalizer::NormalizerRegistry;
use crate::registry::ActionRegistry;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;
use writeback_core::{ActionName, Caller, ConnectorKind, SharedSettings};
use writeback_policy::{
    CapabilityProvider, ContractRegistry, EnablementGate, StaticCapabilities, TARGET_RESOURCE,
    ValidationFailure,
};

/// Performs actions against resources from a [`ResourceStore`].
///
/// All collaborators are immutable and shared; one dispatcher serves any
/// number of concurrent calls.
pub struct Dispatcher {
    registry: Arc<ActionRegistry>,
    contracts: Arc<ContractRegistry>,
    normalizers: Arc<NormalizerRegistry>,
    gate: EnablementGate,
    resources: Arc<dyn ResourceStore>,
    settings: Arc<SharedSettings>,
    audit: Arc<dyn AuditSink>,
}

/// What the audit event needs to know about a call that may stop early.
#[derive(Default)]
struct Trail {
    resource_id: Option<u64>,
    connector: Option<ConnectorKind>,
}

impl Dispatcher {
    /// A dispatcher with the built-in normalizers and capabilities, default
    /// process settings and the tracing audit sink.
    pub fn new(
        registry: Arc<ActionRegistry>,
        contracts: Arc<ContractRegistry>,
        resources: Arc<dyn ResourceStore>,
    ) -> Self {
        Self {
            registry,
            contracts,
            normalizers: Arc::new(NormalizerRegistry::builtin()),
            gate: EnablementGate::new(Arc::new(StaticCapabilities::builtin())),
            resources,
            settings: Arc::new(SharedSettings::default()),
            audit: Arc::new(TracingAuditSink),
        }
    }

    pub fn with_normalizers(mut self, normalizers: Arc<NormalizerRegistry>) -> Self {
        self.normalizers = normalizers;
        self
    }

    pub fn with_capabilities(mut self, capabilities: Arc<dyn CapabilityProvider>) -> Self {
        self.gate = EnablementGate::new(capabilities);
        self
    }

    pub fn with_settings(mut self, settings: Arc<SharedSettings>) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    pub fn contracts(&self) -> &ContractRegistry {
        &self.contracts
    }

    pub fn normalizers(&self) -> &NormalizerRegistry {
        &self.normalizers
    }

    /// Process settings; changes apply to calls that start afterwards.
    pub fn settings(&self) -> &SharedSettings {
        &self.settings
    }

    /// Perform an action given by name. Malformed names are unknown actions.
    pub async fn perform_named(
        &self,
        action: &str,
        args: Value,
        caller: Option<&Caller>,
    ) -> Result<Value, ActionError> {
        let action = ActionName::parse(action).map_err(|_| ActionError::UnknownAction {
            action: action.to_string(),
        })?;
        self.perform_action(&action, args, caller).await
    }

    /// Perform `action` with raw `args` on behalf of `caller`.
    ///
    /// `caller` is `None` for trusted internal invocations, which skip the
    /// authorization check.
    pub async fn perform_action(
        &self,
        action: &ActionName,
        args: Value,
        caller: Option<&Caller>,
    ) -> Result<Value, ActionError> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("perform_action", %action, %request_id);

        async move {
            let mut trail = Trail::default();
            let result = self
                .dispatch(request_id, action, args, caller, &mut trail)
                .await;

            let outcome = match &result {
                Ok(_) => {
                    tracing::info!(resource_id = trail.resource_id, "action performed");
                    Outcome::Succeeded
                }
                Err(err) => {
                    tracing::warn!(
                        kind = %err.kind(),
                        status_code = err.status_code(),
                        resource_id = trail.resource_id,
                        error = %err,
                        "action failed"
                    );
                    Outcome::Failed {
                        kind: err.kind(),
                        status_code: err.status_code(),
                    }
                }
            };

            self.audit.record(ActionEvent {
                request_id,
                occurred_at: Utc::now(),
                action: action.to_string(),
                resource_id: trail.resource_id,
                connector: trail.connector,
                caller_id: caller.map(|c| c.id.clone()),
                outcome,
            });

            result
        }
        .instrument(span)
        .await
    }

    async fn dispatch(
        &self,
        request_id: Uuid,
        action: &ActionName,
        args: Value,
        caller: Option<&Caller>,
        trail: &mut Trail,
    ) -> Result<Value, ActionError> {
        if !self.registry.is_known(action) {
            return Err(ActionError::UnknownAction {
                action: action.to_string(),
            });
        }

        let args = self.normalizers.normalize(action, args)?;
        self.contracts.spec_for(action).validate(&args)?;

        let id = target_resource(&args)?;
        trail.resource_id = Some(id);

        let resource = self
            .resources
            .find_resource(id)
            .await
            .map_err(|source| ActionError::ResourceLookup { id, source })?
            .ok_or(ActionError::NotFound { id })?;
        trail.connector = Some(resource.engine);

        let ctx = ActionContext {
            request_id,
            settings: self.settings.snapshot().scoped(&resource.settings),
            caller: caller.cloned(),
        };
        self.gate.check(action, &resource, &ctx.settings, caller)?;

        let handler = self.registry.resolve(resource.engine, action);
        tracing::debug!(connector = %resource.engine, resource_id = id, "invoking handler");
        handler
            .handle(
                &ctx,
                ActionRequest {
                    connector: resource.engine,
                    action,
                    resource: &resource,
                    args,
                },
            )
            .await
    }
}

/// The positive `database` id of normalized arguments.
fn target_resource(args: &Value) -> Result<u64, ValidationFailure> {
    args.get("database")
        .and_then(Value::as_u64)
        .filter(|id| *id > 0)
        .ok_or_else(|| {
            ValidationFailure::single(
                TARGET_RESOURCE,
                "/database",
                "arguments must name a database by positive integer id",
            )
        })
}

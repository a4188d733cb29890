//! The enablement gate.
//!
//! Before an action reaches its handler the gate checks, in order and
//! stopping at the first refusal:
//!
//! 1. the process-wide `enable-actions` flag,
//! 2. the connector's declared capability for the action's feature,
//! 3. the resource's `database-enable-actions` flag,
//! 4. the caller's authorization (superusers only; no caller is trusted).

use crate::error::GateError;
use std::collections::BTreeMap;
use std::sync::Arc;
use writeback_core::{
    ActionName, Caller, ConnectorKind, DATABASE_ENABLE_ACTIONS, ENABLE_ACTIONS, Feature, Resource,
    ScopedSettings,
};

/// Answers whether a connector kind declares a feature.
pub trait CapabilityProvider: Send + Sync {
    fn supports(&self, kind: ConnectorKind, feature: Feature) -> bool;
}

/// Capability declarations per connector kind.
///
/// A kind without its own declaration for a feature inherits the nearest
/// ancestor's; a feature declared nowhere in the ancestry is unsupported.
#[derive(Debug, Clone, Default)]
pub struct StaticCapabilities {
    declarations: BTreeMap<ConnectorKind, BTreeMap<Feature, bool>>,
}

impl StaticCapabilities {
    /// No declarations at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Built-in declarations: every JDBC engine supports both features,
    /// except Redshift.
    pub fn builtin() -> Self {
        let mut caps = Self::empty();
        caps.declare(ConnectorKind::SqlJdbc, Feature::Actions, true);
        caps.declare(ConnectorKind::SqlJdbc, Feature::BulkActions, true);
        caps.declare(ConnectorKind::Redshift, Feature::Actions, false);
        caps.declare(ConnectorKind::Redshift, Feature::BulkActions, false);
        caps
    }

    /// Declare `feature` as supported or withheld for `kind`.
    pub fn declare(&mut self, kind: ConnectorKind, feature: Feature, supported: bool) {
        self.declarations
            .entry(kind)
            .or_default()
            .insert(feature, supported);
    }

    /// Apply declarations from configuration on top of these.
    pub fn with_overrides(
        mut self,
        overrides: &BTreeMap<ConnectorKind, BTreeMap<Feature, bool>>,
    ) -> Self {
        for (kind, features) in overrides {
            for (feature, supported) in features {
                self.declare(*kind, *feature, *supported);
            }
        }
        self
    }
}

impl CapabilityProvider for StaticCapabilities {
    fn supports(&self, kind: ConnectorKind, feature: Feature) -> bool {
        kind.ancestry()
            .find_map(|k| self.declarations.get(&k)?.get(&feature).copied())
            .unwrap_or(false)
    }
}

/// Ordered, short-circuiting enablement checks.
#[derive(Clone)]
pub struct EnablementGate {
    capabilities: Arc<dyn CapabilityProvider>,
}

impl EnablementGate {
    pub fn new(capabilities: Arc<dyn CapabilityProvider>) -> Self {
        Self { capabilities }
    }

    /// Run every check for one call.
    ///
    /// `settings` must already be scoped to `resource`.
    pub fn check(
        &self,
        action: &ActionName,
        resource: &Resource,
        settings: &ScopedSettings,
        caller: Option<&Caller>,
    ) -> Result<(), GateError> {
        self.check_global(settings)?;
        self.check_connector(action, resource)?;
        self.check_resource(resource, settings)?;
        self.check_caller(caller)
    }

    /// The process-wide switch. Resource overrides do not count here.
    pub fn check_global(&self, settings: &ScopedSettings) -> Result<(), GateError> {
        if settings.process().get_bool(ENABLE_ACTIONS) {
            Ok(())
        } else {
            tracing::debug!("actions disabled process-wide");
            Err(GateError::FeatureDisabled)
        }
    }

    pub fn check_connector(&self, action: &ActionName, resource: &Resource) -> Result<(), GateError> {
        let feature = action.required_feature();
        if self.capabilities.supports(resource.engine, feature) {
            return Ok(());
        }
        tracing::debug!(
            connector = %resource.engine,
            %feature,
            resource_id = resource.id,
            "connector does not declare feature"
        );
        Err(GateError::UnsupportedConnector {
            connector: resource.engine,
            action: action.to_string(),
            feature,
            resource_id: resource.id,
            resource: resource.label(),
        })
    }

    pub fn check_resource(
        &self,
        resource: &Resource,
        settings: &ScopedSettings,
    ) -> Result<(), GateError> {
        if settings.get_bool(DATABASE_ENABLE_ACTIONS) {
            Ok(())
        } else {
            tracing::debug!(
                resource_id = resource.id,
                overridden = settings.is_overridden(DATABASE_ENABLE_ACTIONS),
                "actions disabled for resource"
            );
            Err(GateError::DisabledForResource {
                resource_id: resource.id,
                resource: resource.label(),
            })
        }
    }

    pub fn check_caller(&self, caller: Option<&Caller>) -> Result<(), GateError> {
        match caller {
            Some(caller) if !caller.is_superuser => {
                tracing::debug!(caller = %caller.id, "caller is not a superuser");
                Err(GateError::Unauthorized {
                    caller: caller.id.clone(),
                })
            }
            _ => Ok(()),
        }
    }
}

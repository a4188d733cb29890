//! Handler registry keyed by connector kind and action name.
//!
//! Resolution for `(kind, action)` tries, in order: an exact registration,
//! the kind's ancestors from most to least specific, a wildcard
//! registration for the action, and finally the default handler, which
//! fails with `UnknownAction` or `UnsupportedConnector`.

use crate::handler::{ActionHandler, Unhandled};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use writeback_core::{ActionName, ConnectorKind};

/// Which connector kinds a registration applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Target {
    Kind(ConnectorKind),
    Any,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Kind(kind) => fmt::Display::fmt(kind, f),
            Target::Any => f.write_str("*"),
        }
    }
}

/// Registered action handlers.
///
/// Populated through `&mut self` during startup, then shared read-only.
#[derive(Default)]
pub struct ActionRegistry {
    handlers: HashMap<(Target, ActionName), Arc<dyn ActionHandler>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `action` on `kind` and its descendants.
    /// Replaces an earlier registration for the same pair.
    pub fn register<H>(&mut self, kind: ConnectorKind, action: ActionName, handler: H)
    where
        H: ActionHandler + 'static,
    {
        self.insert(Target::Kind(kind), action, Arc::new(handler));
    }

    /// Register `handler` for `action` on every connector kind without a
    /// more specific registration.
    pub fn register_any<H>(&mut self, action: ActionName, handler: H)
    where
        H: ActionHandler + 'static,
    {
        self.insert(Target::Any, action, Arc::new(handler));
    }

    /// Register an already shared handler.
    pub fn register_shared(
        &mut self,
        target: Target,
        action: ActionName,
        handler: Arc<dyn ActionHandler>,
    ) {
        self.insert(target, action, handler);
    }

    fn insert(&mut self, target: Target, action: ActionName, handler: Arc<dyn ActionHandler>) {
        if self
            .handlers
            .insert((target, action.clone()), handler)
            .is_some()
        {
            tracing::debug!(%target, %action, "replaced action handler");
        }
    }

    /// The registered handler for `(kind, action)`, if any.
    pub fn find(&self, kind: ConnectorKind, action: &ActionName) -> Option<Arc<dyn ActionHandler>> {
        kind.ancestry()
            .map(Target::Kind)
            .chain(std::iter::once(Target::Any))
            .find_map(|target| self.handlers.get(&(target, action.clone())))
            .cloned()
    }

    /// The handler to invoke for `(kind, action)`. Never fails; unmatched
    /// pairs get the default handler.
    pub fn resolve(&self, kind: ConnectorKind, action: &ActionName) -> Arc<dyn ActionHandler> {
        match self.find(kind, action) {
            Some(handler) => handler,
            None => Arc::new(Unhandled {
                known: self.is_known(action),
            }),
        }
    }

    /// Whether any connector kind has a handler for `action`.
    pub fn is_known(&self, action: &ActionName) -> bool {
        self.handlers.keys().any(|(_, name)| name == action)
    }

    /// Every action with at least one registered handler.
    pub fn known_actions(&self) -> BTreeSet<ActionName> {
        self.handlers.keys().map(|(_, name)| name.clone()).collect()
    }

    /// Registration targets for `action`, sorted.
    pub fn targets_for(&self, action: &ActionName) -> Vec<Target> {
        let mut targets: Vec<Target> = self
            .handlers
            .keys()
            .filter(|(_, name)| name == action)
            .map(|(target, _)| *target)
            .collect();
        targets.sort();
        targets
    }
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self
            .handlers
            .keys()
            .map(|(target, action)| format!("{target}:{action}"))
            .collect();
        keys.sort();
        f.debug_struct("ActionRegistry")
            .field("handlers", &keys)
            .finish()
    }
}

//! Target resources and callers.

use crate::connector::ConnectorKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A connector-backed database that actions are executed against.
///
/// Resources are owned by the host's persistence layer; the engine only
/// reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Positive identifier referenced by `database` in argument maps.
    pub id: u64,

    /// Display name.
    #[serde(default)]
    pub name: String,

    /// Connector kind backing this resource.
    pub engine: ConnectorKind,

    /// Resource-local setting overrides, keyed like process settings.
    #[serde(default)]
    pub settings: Map<String, Value>,
}

impl Resource {
    /// Create a resource with no setting overrides.
    pub fn new(id: u64, name: impl Into<String>, engine: ConnectorKind) -> Self {
        Self {
            id,
            name: name.into(),
            engine,
            settings: Map::new(),
        }
    }

    /// Set one resource-local setting override.
    pub fn with_setting(mut self, key: impl Into<String>, value: Value) -> Self {
        self.settings.insert(key.into(), value);
        self
    }

    /// Name used in messages: the display name, or `#id` when unnamed.
    pub fn label(&self) -> String {
        if self.name.is_empty() {
            format!("#{}", self.id)
        } else {
            format!("'{}' (#{})", self.name, self.id)
        }
    }
}

/// The authenticated caller of an invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub id: String,
    #[serde(default)]
    pub is_superuser: bool,
}

impl Caller {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_superuser: false,
        }
    }

    pub fn superuser(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_superuser: true,
        }
    }
}

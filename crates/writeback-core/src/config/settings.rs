//! Process settings and call-scoped overrides.
//!
//! Process-wide settings live in [`SharedSettings`]. A call takes one
//! [`Settings`] snapshot and layers the target resource's own overrides on
//! top in a [`ScopedSettings`] that belongs to that call alone. Nothing is
//! rebound globally, so concurrent calls never see each other's overrides.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::{Arc, PoisonError, RwLock};

/// Process-wide switch for every writeback action.
pub const ENABLE_ACTIONS: &str = "enable-actions";

/// Per-database switch, normally set as a resource override.
pub const DATABASE_ENABLE_ACTIONS: &str = "database-enable-actions";

/// Built-in default for a setting that has no explicit value.
fn default_value(key: &str) -> Option<Value> {
    match key {
        ENABLE_ACTIONS => Some(Value::Bool(true)),
        DATABASE_ENABLE_ACTIONS => Some(Value::Bool(false)),
        _ => None,
    }
}

/// Interpret a setting value as a boolean. Accepts JSON booleans and the
/// strings `"true"`/`"false"` as written by older configuration files.
fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

/// A set of explicitly configured process settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings {
    values: Map<String, Value>,
}

impl Settings {
    /// Create an empty settings set (every key at its default).
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.set(key, value);
        self
    }

    /// Set an explicit value.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    /// Explicit value, falling back to the built-in default.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned().or_else(|| default_value(key))
    }

    /// Boolean value; unset or non-boolean values read as `false` unless
    /// the built-in default says otherwise.
    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key).as_ref().and_then(as_bool).unwrap_or(false)
    }

    /// Layer resource-local overrides on top of this snapshot.
    pub fn scoped(self: &Arc<Self>, overrides: &Map<String, Value>) -> ScopedSettings {
        ScopedSettings {
            base: Arc::clone(self),
            overrides: overrides.clone(),
        }
    }
}

/// Settings as seen by one call: a process snapshot plus one resource's
/// overrides.
#[derive(Debug, Clone)]
pub struct ScopedSettings {
    base: Arc<Settings>,
    overrides: Map<String, Value>,
}

impl ScopedSettings {
    /// Settings with no resource overrides.
    pub fn unscoped(base: Arc<Settings>) -> Self {
        Self {
            base,
            overrides: Map::new(),
        }
    }

    /// Resource override first, then the process snapshot, then the default.
    pub fn get(&self, key: &str) -> Option<Value> {
        match self.overrides.get(key) {
            Some(value) => Some(value.clone()),
            None => self.base.get(key),
        }
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key).as_ref().and_then(as_bool).unwrap_or(false)
    }

    /// Whether `key` is overridden by the resource.
    pub fn is_overridden(&self, key: &str) -> bool {
        self.overrides.contains_key(key)
    }

    /// The process snapshot underneath the overrides.
    pub fn process(&self) -> &Settings {
        &self.base
    }
}

/// Process-wide settings that can be replaced while calls are in flight.
///
/// Readers take a cheap [`Arc`] snapshot; writers swap in a new value.
#[derive(Debug, Default)]
pub struct SharedSettings {
    current: RwLock<Arc<Settings>>,
}

impl SharedSettings {
    pub fn new(settings: Settings) -> Self {
        Self {
            current: RwLock::new(Arc::new(settings)),
        }
    }

    /// The settings in effect right now.
    pub fn snapshot(&self) -> Arc<Settings> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Set one key, leaving in-flight snapshots untouched.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = Settings::clone(&guard);
        next.set(key, value);
        *guard = Arc::new(next);
    }
}

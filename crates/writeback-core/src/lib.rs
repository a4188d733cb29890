//! # writeback-core
//!
//! Shared vocabulary for the writeback actions engine: action names,
//! connector kinds and their capability features, target resources,
//! callers, process settings with call-scoped overrides, and the YAML
//! configuration that ties them together.

pub mod action;
pub mod config;
pub mod connector;
pub mod resource;

pub use action::{ActionFamily, ActionName, ActionNameError};
pub use config::{
    ConfigError, DATABASE_ENABLE_ACTIONS, ENABLE_ACTIONS, ResourceConfig, ScopedSettings,
    Settings, SharedSettings, TableSeed, WritebackConfig,
};
pub use connector::{ConnectorKind, Feature, UnknownConnectorKind};
pub use resource::{Caller, Resource};

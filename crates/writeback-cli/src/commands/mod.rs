//! CLI command implementations.

pub mod actions;
pub mod check;
pub mod run;

use anyhow::{Context, Result};
use serde_json::Value;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use writeback_core::{ConnectorKind, SharedSettings, WritebackConfig};
use writeback_memory::{MemoryResourceStore, MemoryTables, register_memory_handlers};
use writeback_policy::{ContractRegistry, StaticCapabilities};
use writeback_runtime::{ActionRegistry, Dispatcher, TracingAuditSink};

/// Load the configuration file, or an empty configuration when none is given.
pub fn load_config(path: Option<&Path>) -> Result<WritebackConfig> {
    match path {
        Some(path) => WritebackConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {:?}", path)),
        None => Ok(WritebackConfig::default()),
    }
}

/// Read JSON arguments from `path`, or from stdin.
pub fn read_args(path: Option<&Path>) -> Result<Value> {
    let content = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read arguments file: {:?}", path))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read arguments from stdin")?;
            buf
        }
    };
    serde_json::from_str(&content).context("Arguments are not valid JSON")
}

/// Wire a dispatcher over the in-memory connector seeded from `config`.
///
/// Handlers are registered under `sql-jdbc`, so every JDBC engine resolves
/// through the hierarchy.
pub fn dispatcher(config: &WritebackConfig) -> Result<Dispatcher> {
    let tables = Arc::new(MemoryTables::from_config(config));
    let mut registry = ActionRegistry::new();
    register_memory_handlers(&mut registry, ConnectorKind::SqlJdbc, tables);

    let contracts = ContractRegistry::builtin().context("Failed to compile action contracts")?;
    let capabilities = StaticCapabilities::builtin().with_overrides(&config.capabilities);

    Ok(Dispatcher::new(
        Arc::new(registry),
        Arc::new(contracts),
        Arc::new(MemoryResourceStore::from_config(config)),
    )
    .with_capabilities(Arc::new(capabilities))
    .with_settings(Arc::new(SharedSettings::new(config.settings.clone())))
    .with_audit(Arc::new(TracingAuditSink)))
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

//! `writeback actions` command implementation.

use anyhow::Result;
use serde_json::{Map, Value, json};
use writeback_core::WritebackConfig;
use writeback_runtime::Dispatcher;

/// One row per known action: its contract and the kinds with handlers.
pub fn describe(dispatcher: &Dispatcher) -> Vec<Value> {
    dispatcher
        .registry()
        .known_actions()
        .into_iter()
        .map(|action| {
            let targets: Vec<String> = dispatcher
                .registry()
                .targets_for(&action)
                .iter()
                .map(ToString::to_string)
                .collect();
            json!({
                "action": action.as_str(),
                "contract": dispatcher.contracts().spec_for(&action).name(),
                "connectors": targets,
            })
        })
        .collect()
}

/// Contract schemas of the known actions, keyed by action name.
pub fn schemas(dispatcher: &Dispatcher) -> Map<String, Value> {
    dispatcher
        .registry()
        .known_actions()
        .into_iter()
        .map(|action| {
            let schema = dispatcher.contracts().spec_for(&action).schema().clone();
            (action.to_string(), schema)
        })
        .collect()
}

pub fn run(config: &WritebackConfig, with_schemas: bool) -> Result<()> {
    let dispatcher = super::dispatcher(config)?;
    let actions = describe(&dispatcher);

    println!("\n⚡ Actions ({}):", actions.len());
    for entry in &actions {
        println!(
            "   {:<14} contract: {:<14} connectors: {}",
            entry["action"].as_str().unwrap_or_default(),
            entry["contract"].as_str().unwrap_or_default(),
            entry["connectors"]
                .as_array()
                .map(|kinds| kinds
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(", "))
                .unwrap_or_default(),
        );
    }

    if with_schemas {
        println!("\n📐 Contract schemas:");
        super::print_json(&schemas(&dispatcher))?;
    }
    Ok(())
}

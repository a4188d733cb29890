//! `writeback check` command implementation.
//!
//! Runs the normalization and contract steps of a dispatch without touching
//! any resource, then prints the canonical arguments or every violation.

use anyhow::Result;
use serde_json::Value;
use writeback_core::{ActionName, WritebackConfig};
use writeback_policy::ValidationFailure;
use writeback_runtime::Dispatcher;

/// Outcome of checking one set of arguments.
#[derive(Debug)]
pub enum CheckOutcome {
    Valid(Value),
    Invalid(ValidationFailure),
    UnknownAction(String),
}

/// Normalize `args` for `action` and validate them against its contract.
pub fn check_args(dispatcher: &Dispatcher, action: &str, args: Value) -> CheckOutcome {
    let action = match ActionName::parse(action) {
        Ok(action) if dispatcher.registry().is_known(&action) => action,
        _ => return CheckOutcome::UnknownAction(action.to_string()),
    };

    let canonical = match dispatcher.normalizers().normalize(&action, args) {
        Ok(canonical) => canonical,
        Err(failure) => return CheckOutcome::Invalid(failure),
    };
    match dispatcher.contracts().spec_for(&action).validate(&canonical) {
        Ok(()) => CheckOutcome::Valid(canonical),
        Err(failure) => CheckOutcome::Invalid(failure),
    }
}

pub fn run(config: &WritebackConfig, action: &str, args: Value) -> Result<bool> {
    let dispatcher = super::dispatcher(config)?;

    match check_args(&dispatcher, action, args) {
        CheckOutcome::Valid(canonical) => {
            super::print_json(&canonical)?;
            Ok(true)
        }
        CheckOutcome::Invalid(failure) => {
            eprintln!("Arguments rejected by {}:", failure.contract);
            for violation in &failure.violations {
                let path = if violation.path.is_empty() {
                    "(root)"
                } else {
                    violation.path.as_str()
                };
                eprintln!("  - {}: {}", path, violation.message);
            }
            Ok(false)
        }
        CheckOutcome::UnknownAction(action) => {
            eprintln!("Unknown action: {action}");
            Ok(false)
        }
    }
}

//! Action argument contracts.
//!
//! A [`Contract`] is a compiled JSON Schema (draft 2020-12) guarding one
//! action's normalized arguments. Actions without a registered contract get
//! the permissive `any` contract.

use crate::error::{ContractError, ValidationFailure, Violation};
use crate::schemas;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use writeback_core::ActionName;

/// Name of the permissive default contract.
pub const ANY: &str = "any";

/// A named argument contract.
#[derive(Debug, Clone)]
pub struct Contract {
    name: String,
    schema: Value,
    validator: Option<jsonschema::Validator>,
}

impl Contract {
    /// The contract every argument value satisfies.
    pub fn any() -> Self {
        Self {
            name: ANY.to_string(),
            schema: Value::Bool(true),
            validator: None,
        }
    }

    /// Compile a contract from a JSON Schema.
    pub fn from_schema(name: impl Into<String>, schema: Value) -> Result<Self, ContractError> {
        let name = name.into();
        let validator = jsonschema::draft202012::options()
            .build(&schema)
            .map_err(|e| ContractError {
                name: name.clone(),
                message: e.to_string(),
            })?;
        Ok(Self {
            name,
            schema,
            validator: Some(validator),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Check `args`, reporting every violated constraint at once.
    pub fn validate(&self, args: &Value) -> Result<(), ValidationFailure> {
        let Some(validator) = &self.validator else {
            return Ok(());
        };

        let violations: Vec<Violation> = validator
            .iter_errors(args)
            .map(|error| Violation::new(error.instance_path().to_string(), error.to_string()))
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationFailure::new(self.name.clone(), violations))
        }
    }
}

/// Contracts by action name.
#[derive(Debug, Clone)]
pub struct ContractRegistry {
    contracts: HashMap<ActionName, Arc<Contract>>,
    fallback: Arc<Contract>,
}

impl Default for ContractRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ContractRegistry {
    /// A registry with no contracts; every action gets `any`.
    pub fn new() -> Self {
        Self {
            contracts: HashMap::new(),
            fallback: Arc::new(Contract::any()),
        }
    }

    /// A registry holding the contracts of the built-in actions.
    pub fn builtin() -> Result<Self, ContractError> {
        let mut registry = Self::new();
        let table = [
            (ActionName::ROW_CREATE, schemas::row_create()),
            (ActionName::ROW_UPDATE, schemas::row_update()),
            (ActionName::ROW_DELETE, schemas::row_delete()),
            (ActionName::BULK_CREATE, schemas::bulk(schemas::row_create())),
            (ActionName::BULK_UPDATE, schemas::bulk(schemas::row_update())),
            (ActionName::BULK_DELETE, schemas::bulk(schemas::row_delete())),
        ];
        for (action, schema) in table {
            let contract = Contract::from_schema(action.as_str(), schema)?;
            registry.register(action, contract);
        }
        Ok(registry)
    }

    /// Install the contract for `action`, replacing any earlier one.
    pub fn register(&mut self, action: ActionName, contract: Contract) {
        self.contracts.insert(action, Arc::new(contract));
    }

    /// The contract guarding `action`.
    pub fn spec_for(&self, action: &ActionName) -> Arc<Contract> {
        self.contracts
            .get(action)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }
}

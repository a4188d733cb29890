//! # writeback-policy
//!
//! What an action is allowed to receive and when it is allowed to run:
//!
//! - [`ContractRegistry`] maps each action to a compiled JSON Schema
//!   [`Contract`] over its normalized arguments.
//! - [`EnablementGate`] runs the global, connector, resource and caller
//!   checks in order.

pub mod contracts;
pub mod error;
pub mod gate;
pub mod schemas;

pub use contracts::{ANY, Contract, ContractRegistry};
pub use error::{
    ContractError, GateError, STRUCTURED_QUERY, TARGET_RESOURCE, ValidationFailure, Violation,
};
pub use gate::{CapabilityProvider, EnablementGate, StaticCapabilities};

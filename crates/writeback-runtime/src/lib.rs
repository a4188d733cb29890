//! # writeback-runtime
//!
//! Dispatches writeback actions: an [`ActionRegistry`] of handlers keyed by
//! connector kind and action name, per-family [`ArgNormalizer`]s, and the
//! [`Dispatcher`] that runs normalization, contract validation, the
//! enablement gate and the handler for each call.

pub mod adapter;
pub mod audit;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod normalizer;
pub mod registry;

pub use adapter::ResourceStore;
pub use audit::{ActionEvent, AuditSink, NullAuditSink, Outcome, TracingAuditSink};
pub use context::ActionContext;
pub use dispatcher::Dispatcher;
pub use error::{ActionError, ActionFailure, ErrorKind, HandlerError};
pub use handler::{ActionHandler, ActionRequest};
pub use normalizer::{ArgNormalizer, BulkNormalizer, NormalizerRegistry, RowQueryNormalizer};
pub use registry::{ActionRegistry, Target};

//! # writeback-memory
//!
//! An in-memory connector: resources and tables seeded from configuration,
//! and handlers for the built-in `row/*` and `bulk/*` actions that evaluate
//! structured-query filters against rows held in memory.

pub mod error;
pub mod eval;
pub mod handlers;
pub mod store;
pub mod tables;

pub use error::MemoryError;
pub use handlers::register_memory_handlers;
pub use store::MemoryResourceStore;
pub use tables::{BatchCounts, MemoryTables, RowOp, Table};

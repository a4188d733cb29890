//! # writeback-query
//!
//! The structured-query document that row actions take as arguments, and
//! the filter clause grammar inside it.
//!
//! - [`normalize_query`] rewrites legacy document shapes into the canonical
//!   one and checks the grammar.
//! - [`Clause`] is the parsed form of a filter, used by connectors that
//!   evaluate filters themselves.

pub mod error;
pub mod filter;
pub mod normalize;

pub use error::QueryError;
pub use filter::{
    Clause, CompareOp, FieldId, FieldRef, StringOp, normalize_clause, validate_clause,
};
pub use normalize::{QUERY_TYPE, normalize_query, query_filter, source_table, validate_query};

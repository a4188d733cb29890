//! Connector kinds and the capability features they may declare.
//!
//! Kinds form a small static hierarchy. A kind inherits handlers and
//! capability declarations from its ancestors unless it declares its own.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Backend engine family a resource is backed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectorKind {
    /// Abstract root of every SQL engine.
    Sql,
    /// Abstract parent of engines reached through a JDBC-style driver.
    SqlJdbc,
    Postgres,
    Redshift,
    #[serde(rename = "mysql")]
    MySql,
    H2,
    Sqlite,
    #[serde(rename = "sqlserver")]
    SqlServer,
    #[serde(rename = "bigquery")]
    BigQuery,
    Mongo,
}

impl ConnectorKind {
    /// Every declared kind.
    pub const ALL: [ConnectorKind; 10] = [
        ConnectorKind::Sql,
        ConnectorKind::SqlJdbc,
        ConnectorKind::Postgres,
        ConnectorKind::Redshift,
        ConnectorKind::MySql,
        ConnectorKind::H2,
        ConnectorKind::Sqlite,
        ConnectorKind::SqlServer,
        ConnectorKind::BigQuery,
        ConnectorKind::Mongo,
    ];

    /// The immediate parent kind, if any.
    pub fn parent(self) -> Option<ConnectorKind> {
        match self {
            ConnectorKind::Sql | ConnectorKind::Mongo => None,
            ConnectorKind::SqlJdbc | ConnectorKind::BigQuery => Some(ConnectorKind::Sql),
            ConnectorKind::Postgres
            | ConnectorKind::MySql
            | ConnectorKind::H2
            | ConnectorKind::Sqlite
            | ConnectorKind::SqlServer => Some(ConnectorKind::SqlJdbc),
            ConnectorKind::Redshift => Some(ConnectorKind::Postgres),
        }
    }

    /// This kind followed by its ancestors, most specific first.
    pub fn ancestry(self) -> impl Iterator<Item = ConnectorKind> {
        std::iter::successors(Some(self), |kind| kind.parent())
    }

    /// Canonical string form, as used in configuration.
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectorKind::Sql => "sql",
            ConnectorKind::SqlJdbc => "sql-jdbc",
            ConnectorKind::Postgres => "postgres",
            ConnectorKind::Redshift => "redshift",
            ConnectorKind::MySql => "mysql",
            ConnectorKind::H2 => "h2",
            ConnectorKind::Sqlite => "sqlite",
            ConnectorKind::SqlServer => "sqlserver",
            ConnectorKind::BigQuery => "bigquery",
            ConnectorKind::Mongo => "mongo",
        }
    }
}

impl fmt::Display for ConnectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectorKind {
    type Err = UnknownConnectorKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConnectorKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownConnectorKind(s.to_string()))
    }
}

/// Error returned when parsing an undeclared connector kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown connector kind '{0}'")]
pub struct UnknownConnectorKind(pub String);

/// A capability a connector kind may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Feature {
    /// Single-row writeback actions (and any non-bulk family).
    Actions,
    /// Batched writeback actions.
    BulkActions,
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feature::Actions => f.write_str("actions"),
            Feature::BulkActions => f.write_str("bulk-actions"),
        }
    }
}

//! Action names.
//!
//! An action name is a `namespace/verb` pair such as `row/create`. Names are
//! open: hosts may register handlers for any well-formed name, but the
//! engine ships contracts and normalizers for the `row` and `bulk` families.

use crate::connector::Feature;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Identifier of a writeback action, composed of a namespace and a verb.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ActionName(Cow<'static, str>);

impl ActionName {
    pub const ROW_CREATE: ActionName = ActionName(Cow::Borrowed("row/create"));
    pub const ROW_UPDATE: ActionName = ActionName(Cow::Borrowed("row/update"));
    pub const ROW_DELETE: ActionName = ActionName(Cow::Borrowed("row/delete"));
    pub const BULK_CREATE: ActionName = ActionName(Cow::Borrowed("bulk/create"));
    pub const BULK_UPDATE: ActionName = ActionName(Cow::Borrowed("bulk/update"));
    pub const BULK_DELETE: ActionName = ActionName(Cow::Borrowed("bulk/delete"));

    /// Every action the engine ships contracts for.
    pub const BUILTIN: [ActionName; 6] = [
        Self::ROW_CREATE,
        Self::ROW_UPDATE,
        Self::ROW_DELETE,
        Self::BULK_CREATE,
        Self::BULK_UPDATE,
        Self::BULK_DELETE,
    ];

    /// Parse an action name of the form `namespace/verb`.
    pub fn parse(name: &str) -> Result<Self, ActionNameError> {
        let mut parts = name.split('/');
        let (Some(namespace), Some(verb), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(ActionNameError::Malformed(name.to_string()));
        };
        let valid = |s: &str| {
            !s.is_empty()
                && s.chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        };
        if !valid(namespace) || !valid(verb) {
            return Err(ActionNameError::Malformed(name.to_string()));
        }
        Ok(Self(Cow::Owned(name.to_string())))
    }

    /// The full `namespace/verb` string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The namespace part (`row` in `row/create`).
    pub fn namespace(&self) -> &str {
        self.as_str().split_once('/').map(|(ns, _)| ns).unwrap_or_default()
    }

    /// The verb part (`create` in `row/create`).
    pub fn verb(&self) -> &str {
        self.as_str().split_once('/').map(|(_, verb)| verb).unwrap_or_default()
    }

    /// The built-in family this action belongs to, if any.
    pub fn family(&self) -> Option<ActionFamily> {
        match self.namespace() {
            "row" => Some(ActionFamily::Row),
            "bulk" => Some(ActionFamily::Bulk),
            _ => None,
        }
    }

    /// The connector capability an action of this name requires.
    pub fn required_feature(&self) -> Feature {
        match self.family() {
            Some(ActionFamily::Bulk) => Feature::BulkActions,
            _ => Feature::Actions,
        }
    }
}

impl fmt::Display for ActionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionName {
    type Err = ActionNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ActionName {
    type Error = ActionNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ActionName> for String {
    fn from(name: ActionName) -> Self {
        name.0.into_owned()
    }
}

/// Groups of actions sharing an argument shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionFamily {
    /// Single-row mutations over a structured query.
    Row,
    /// Batches of row mutations against one database.
    Bulk,
}

/// Error returned when an action name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionNameError {
    #[error("malformed action name '{0}': expected namespace/verb")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_namespace_and_verb() {
        let name = ActionName::parse("row/create").unwrap();
        assert_eq!(name, ActionName::ROW_CREATE);
        assert_eq!(name.namespace(), "row");
        assert_eq!(name.verb(), "create");
        assert_eq!(name.family(), Some(ActionFamily::Row));
    }

    #[test]
    fn rejects_malformed_names() {
        for bad in ["row", "row/", "/create", "row/create/x", "row/cre ate", ""] {
            assert!(ActionName::parse(bad).is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn custom_namespaces_require_the_actions_feature() {
        let name = ActionName::parse("model/execute").unwrap();
        assert_eq!(name.family(), None);
        assert_eq!(name.required_feature(), Feature::Actions);
        assert_eq!(ActionName::BULK_DELETE.required_feature(), Feature::BulkActions);
    }

    #[test]
    fn serializes_as_a_plain_string() {
        let json = serde_json::to_value(ActionName::ROW_UPDATE).unwrap();
        assert_eq!(json, serde_json::json!("row/update"));
        let back: ActionName = serde_json::from_value(json).unwrap();
        assert_eq!(back, ActionName::ROW_UPDATE);
    }
}

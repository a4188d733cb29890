//! Filter clauses.
//!
//! Filters are MBQL-style arrays headed by a lowercase kebab-case operator:
//!
//! ```text
//! ["and", ["=", ["field", 1, null], 5], ["is-null", ["field", "deleted_at", null]]]
//! ```
//!
//! [`Clause::parse`] accepts the legacy spellings still produced by older
//! clients (upper-case or snake_case operators, bare integer field ids,
//! `["field-id", id]`, two-element field references, single-clause
//! `and`/`or`). [`Clause::to_value`] always renders the canonical form, so
//! parsing and rendering is idempotent.

use crate::error::{QueryError, describe};
use serde_json::{Map, Value};

/// How strictly clauses are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    /// Accept legacy spellings and canonicalize them.
    Lenient,
    /// Accept only the canonical form.
    Strict,
}

/// Comparison operators taking a field and one or more values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Between,
}

impl CompareOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Between => "between",
        }
    }
}

/// String matching operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringOp {
    Contains,
    DoesNotContain,
    StartsWith,
    EndsWith,
}

impl StringOp {
    pub fn as_str(self) -> &'static str {
        match self {
            StringOp::Contains => "contains",
            StringOp::DoesNotContain => "does-not-contain",
            StringOp::StartsWith => "starts-with",
            StringOp::EndsWith => "ends-with",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    And,
    Or,
    Not,
    Compare(CompareOp),
    IsNull,
    NotNull,
    Match(StringOp),
}

impl Operator {
    fn as_str(self) -> &'static str {
        match self {
            Operator::And => "and",
            Operator::Or => "or",
            Operator::Not => "not",
            Operator::Compare(op) => op.as_str(),
            Operator::IsNull => "is-null",
            Operator::NotNull => "not-null",
            Operator::Match(op) => op.as_str(),
        }
    }

    fn from_canonical(name: &str) -> Option<Self> {
        let op = match name {
            "and" => Operator::And,
            "or" => Operator::Or,
            "not" => Operator::Not,
            "=" => Operator::Compare(CompareOp::Eq),
            "!=" => Operator::Compare(CompareOp::Ne),
            "<" => Operator::Compare(CompareOp::Lt),
            "<=" => Operator::Compare(CompareOp::Le),
            ">" => Operator::Compare(CompareOp::Gt),
            ">=" => Operator::Compare(CompareOp::Ge),
            "between" => Operator::Compare(CompareOp::Between),
            "is-null" => Operator::IsNull,
            "not-null" => Operator::NotNull,
            "contains" => Operator::Match(StringOp::Contains),
            "does-not-contain" => Operator::Match(StringOp::DoesNotContain),
            "starts-with" => Operator::Match(StringOp::StartsWith),
            "ends-with" => Operator::Match(StringOp::EndsWith),
            _ => return None,
        };
        Some(op)
    }

    fn parse(raw: &str, mode: Mode) -> Option<Self> {
        match mode {
            Mode::Strict => Self::from_canonical(raw),
            Mode::Lenient => Self::from_canonical(&canonical_token(raw)),
        }
    }
}

/// Lowercase kebab-case spelling of an operator or tag.
fn canonical_token(raw: &str) -> String {
    raw.to_ascii_lowercase().replace('_', "-")
}

/// Identifier part of a field reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldId {
    Id(u64),
    Name(String),
}

/// A reference to one column of the source table.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRef {
    pub id: FieldId,
    pub options: Option<Map<String, Value>>,
}

impl FieldRef {
    pub fn to_value(&self) -> Value {
        let id = match &self.id {
            FieldId::Id(id) => Value::from(*id),
            FieldId::Name(name) => Value::String(name.clone()),
        };
        let options = self.options.clone().map(Value::Object).unwrap_or(Value::Null);
        Value::Array(vec![Value::String("field".to_string()), id, options])
    }
}

/// A parsed filter clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    And(Vec<Clause>),
    Or(Vec<Clause>),
    Not(Box<Clause>),
    Compare {
        op: CompareOp,
        field: FieldRef,
        values: Vec<Value>,
    },
    IsNull(FieldRef),
    NotNull(FieldRef),
    Match {
        op: StringOp,
        field: FieldRef,
        pattern: String,
    },
}

impl Clause {
    /// Parse a clause, accepting legacy spellings.
    pub fn parse(value: &Value) -> Result<Self, QueryError> {
        parse_clause(value, "", Mode::Lenient)
    }

    /// Parse a clause that must already be canonical.
    pub fn parse_canonical(value: &Value) -> Result<Self, QueryError> {
        parse_clause(value, "", Mode::Strict)
    }

    /// Conjunction; nested conjunctions are flattened and a single clause
    /// stands for itself.
    pub fn and(clauses: Vec<Clause>) -> Clause {
        let mut flat = Vec::with_capacity(clauses.len());
        for clause in clauses {
            match clause {
                Clause::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        collapse(flat, Clause::And)
    }

    /// Disjunction; flattened and collapsed like [`Clause::and`].
    pub fn or(clauses: Vec<Clause>) -> Clause {
        let mut flat = Vec::with_capacity(clauses.len());
        for clause in clauses {
            match clause {
                Clause::Or(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        collapse(flat, Clause::Or)
    }

    /// Canonical JSON form.
    pub fn to_value(&self) -> Value {
        let mut items = Vec::new();
        match self {
            Clause::And(clauses) | Clause::Or(clauses) => {
                let op = if matches!(self, Clause::And(_)) {
                    Operator::And
                } else {
                    Operator::Or
                };
                items.push(Value::String(op.as_str().to_string()));
                items.extend(clauses.iter().map(Clause::to_value));
            }
            Clause::Not(inner) => {
                items.push(Value::String(Operator::Not.as_str().to_string()));
                items.push(inner.to_value());
            }
            Clause::Compare { op, field, values } => {
                items.push(Value::String(op.as_str().to_string()));
                items.push(field.to_value());
                items.extend(values.iter().cloned());
            }
            Clause::IsNull(field) | Clause::NotNull(field) => {
                let op = if matches!(self, Clause::IsNull(_)) {
                    Operator::IsNull
                } else {
                    Operator::NotNull
                };
                items.push(Value::String(op.as_str().to_string()));
                items.push(field.to_value());
            }
            Clause::Match { op, field, pattern } => {
                items.push(Value::String(op.as_str().to_string()));
                items.push(field.to_value());
                items.push(Value::String(pattern.clone()));
            }
        }
        Value::Array(items)
    }
}

fn collapse(mut clauses: Vec<Clause>, wrap: fn(Vec<Clause>) -> Clause) -> Clause {
    match clauses.pop() {
        Some(only) if clauses.is_empty() => only,
        Some(last) => {
            clauses.push(last);
            wrap(clauses)
        }
        None => wrap(clauses),
    }
}

/// Canonicalize a filter clause located at `path`.
pub fn normalize_clause(value: &Value, path: &str) -> Result<Value, QueryError> {
    parse_clause(value, path, Mode::Lenient).map(|clause| clause.to_value())
}

/// Check that a filter clause located at `path` is canonical and well formed.
pub fn validate_clause(value: &Value, path: &str) -> Result<(), QueryError> {
    parse_clause(value, path, Mode::Strict).map(|_| ())
}

fn child(path: &str, index: usize) -> String {
    format!("{path}/{index}")
}

pub(crate) fn parse_clause(value: &Value, path: &str, mode: Mode) -> Result<Clause, QueryError> {
    let not_a_clause = || QueryError::NotAClause {
        path: path.to_string(),
        found: describe(value),
    };

    let items = match value {
        Value::Array(items) if !items.is_empty() => items,
        _ => return Err(not_a_clause()),
    };
    let Value::String(raw) = &items[0] else {
        return Err(not_a_clause());
    };
    let operator = Operator::parse(raw, mode).ok_or_else(|| QueryError::UnknownOperator {
        path: child(path, 0),
        operator: raw.clone(),
    })?;

    let args = &items[1..];
    let arity = |expected: &'static str| QueryError::Arity {
        path: path.to_string(),
        operator: operator.as_str().to_string(),
        expected,
        found: args.len(),
    };

    match operator {
        Operator::And | Operator::Or => {
            let (min, expected) = match mode {
                Mode::Lenient => (1, "at least one clause"),
                Mode::Strict => (2, "at least two clauses"),
            };
            if args.len() < min {
                return Err(arity(expected));
            }
            let clauses = args
                .iter()
                .enumerate()
                .map(|(i, arg)| parse_clause(arg, &child(path, i + 1), mode))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(match (operator, mode) {
                (Operator::And, Mode::Lenient) => Clause::and(clauses),
                (Operator::And, Mode::Strict) => Clause::And(clauses),
                (_, Mode::Lenient) => Clause::or(clauses),
                (_, Mode::Strict) => Clause::Or(clauses),
            })
        }
        Operator::Not => {
            let [inner] = args else {
                return Err(arity("exactly one clause"));
            };
            let inner = parse_clause(inner, &child(path, 1), mode)?;
            Ok(Clause::Not(Box::new(inner)))
        }
        Operator::Compare(op) => {
            let (min, max, expected) = match op {
                CompareOp::Eq | CompareOp::Ne => (2, usize::MAX, "a field and at least one value"),
                CompareOp::Between => (3, 3, "a field, a minimum and a maximum"),
                _ => (2, 2, "a field and one value"),
            };
            if args.len() < min || args.len() > max {
                return Err(arity(expected));
            }
            let field = parse_field(&args[0], &child(path, 1), mode)?;
            let values = args[1..]
                .iter()
                .enumerate()
                .map(|(i, v)| check_value(op, v, &child(path, i + 2)))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Clause::Compare { op, field, values })
        }
        Operator::IsNull | Operator::NotNull => {
            let [field] = args else {
                return Err(arity("exactly one field"));
            };
            let field = parse_field(field, &child(path, 1), mode)?;
            Ok(if operator == Operator::IsNull {
                Clause::IsNull(field)
            } else {
                Clause::NotNull(field)
            })
        }
        Operator::Match(op) => {
            let [field, pattern] = args else {
                return Err(arity("a field and a string"));
            };
            let field = parse_field(field, &child(path, 1), mode)?;
            let Value::String(pattern) = pattern else {
                return Err(QueryError::InvalidValue {
                    path: child(path, 2),
                    found: describe(pattern),
                    reason: "expected a string",
                });
            };
            Ok(Clause::Match {
                op,
                field,
                pattern: pattern.clone(),
            })
        }
    }
}

fn check_value(op: CompareOp, value: &Value, path: &str) -> Result<Value, QueryError> {
    let reason = match (op, value) {
        (_, Value::Array(_) | Value::Object(_)) => Some("expected a scalar"),
        (CompareOp::Eq | CompareOp::Ne, _) => None,
        (_, Value::Number(_) | Value::String(_)) => None,
        _ => Some("expected a number or string"),
    };
    match reason {
        Some(reason) => Err(QueryError::InvalidValue {
            path: path.to_string(),
            found: describe(value),
            reason,
        }),
        None => Ok(value.clone()),
    }
}

fn parse_field(value: &Value, path: &str, mode: Mode) -> Result<FieldRef, QueryError> {
    read_field(value, mode).ok_or_else(|| QueryError::InvalidFieldRef {
        path: path.to_string(),
        found: describe(value),
    })
}

fn read_field(value: &Value, mode: Mode) -> Option<FieldRef> {
    let lenient = mode == Mode::Lenient;
    match value {
        Value::Number(_) if lenient => Some(FieldRef {
            id: FieldId::Id(positive_id(value)?),
            options: None,
        }),
        Value::Array(items) => {
            let (Value::String(raw_tag), rest) = items.split_first()? else {
                return None;
            };
            let tag = if lenient {
                canonical_token(raw_tag)
            } else {
                raw_tag.clone()
            };
            match (tag.as_str(), rest) {
                ("field-id", [id]) if lenient => Some(FieldRef {
                    id: FieldId::Id(positive_id(id)?),
                    options: None,
                }),
                ("field", [id]) if lenient => Some(FieldRef {
                    id: field_id(id)?,
                    options: None,
                }),
                ("field", [id, options]) => {
                    let options = match options {
                        Value::Null => None,
                        Value::Object(map) => Some(map.clone()),
                        _ => return None,
                    };
                    Some(FieldRef {
                        id: field_id(id)?,
                        options,
                    })
                }
                _ => None,
            }
        }
        _ => None,
    }
}

fn positive_id(value: &Value) -> Option<u64> {
    value.as_u64().filter(|id| *id > 0)
}

fn field_id(value: &Value) -> Option<FieldId> {
    match value {
        Value::String(name) if !name.is_empty() => Some(FieldId::Name(name.clone())),
        Value::Number(_) => positive_id(value).map(FieldId::Id),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize(value: Value) -> Result<Value, QueryError> {
        normalize_clause(&value, "/filter")
    }

    #[test]
    fn canonical_clause_is_unchanged() {
        let clause = json!(["=", ["field", 1, null], 5]);
        assert_eq!(normalize(clause.clone()).unwrap(), clause);
        assert!(validate_clause(&clause, "").is_ok());
    }

    #[test]
    fn legacy_field_references_are_canonicalized() {
        assert_eq!(
            normalize(json!(["=", 1, 5])).unwrap(),
            json!(["=", ["field", 1, null], 5])
        );
        assert_eq!(
            normalize(json!(["=", ["field-id", 1], 5])).unwrap(),
            json!(["=", ["field", 1, null], 5])
        );
        assert_eq!(
            normalize(json!(["=", ["field", "name"], "x"])).unwrap(),
            json!(["=", ["field", "name", null], "x"])
        );
        assert_eq!(
            normalize(json!(["=", ["FIELD_ID", 3], 5])).unwrap(),
            json!(["=", ["field", 3, null], 5])
        );
    }

    #[test]
    fn operator_aliases_are_canonicalized() {
        assert_eq!(
            normalize(json!(["IS_NULL", ["field", 2, null]])).unwrap(),
            json!(["is-null", ["field", 2, null]])
        );
        assert_eq!(
            normalize(json!(["Starts_With", ["field", 2, null], "Al"])).unwrap(),
            json!(["starts-with", ["field", 2, null], "Al"])
        );
    }

    #[test]
    fn single_clause_conjunction_collapses() {
        assert_eq!(
            normalize(json!(["and", ["=", 1, 5]])).unwrap(),
            json!(["=", ["field", 1, null], 5])
        );
    }

    #[test]
    fn nested_same_operator_flattens() {
        let clause = json!([
            "and",
            ["and", ["=", 1, 1], ["=", 2, 2]],
            ["or", ["=", 3, 3], ["or", ["=", 4, 4]]]
        ]);
        assert_eq!(
            normalize(clause).unwrap(),
            json!([
                "and",
                ["=", ["field", 1, null], 1],
                ["=", ["field", 2, null], 2],
                ["or", ["=", ["field", 3, null], 3], ["=", ["field", 4, null], 4]]
            ])
        );
    }

    #[test]
    fn normalization_is_idempotent() {
        let clause = json!([
            "OR",
            ["and", ["field-id", 1]],
            ["not", ["BETWEEN", 2, 1, 10]],
            ["!=", ["field", "status"], "a", "b"]
        ]);
        // ["and", x] with a field reference is not a clause
        assert!(normalize(clause).is_err());

        let clause = json!([
            "OR",
            ["and", ["NOT_NULL", ["field-id", 1]]],
            ["not", ["BETWEEN", 2, 1, 10]],
            ["!=", ["field", "status"], "a", "b"]
        ]);
        let once = normalize(clause).unwrap();
        let twice = normalize(once.clone()).unwrap();
        assert_eq!(once, twice);
        assert!(validate_clause(&once, "").is_ok());
    }

    #[test]
    fn arity_violations_name_the_clause() {
        let err = normalize(json!(["between", 1, 5])).unwrap_err();
        assert_eq!(err.path(), "/filter");
        assert!(err.to_string().contains("'between' expects"));

        assert!(matches!(
            normalize(json!(["and"])),
            Err(QueryError::Arity { .. })
        ));
        assert!(matches!(
            normalize(json!(["=", ["field", 1, null]])),
            Err(QueryError::Arity { .. })
        ));
    }

    #[test]
    fn unknown_operators_are_rejected() {
        let err = normalize(json!(["like", 1, "x"])).unwrap_err();
        assert_eq!(err.path(), "/filter/0");
        assert!(matches!(err, QueryError::UnknownOperator { .. }));
    }

    #[test]
    fn malformed_field_references_are_rejected() {
        for field in [json!(0), json!(-1), json!(["field", ""]), json!(["field", 1, 7])] {
            let err = normalize(json!(["=", field, 1])).unwrap_err();
            assert!(matches!(err, QueryError::InvalidFieldRef { .. }), "{err}");
            assert_eq!(err.path(), "/filter/1");
        }
    }

    #[test]
    fn values_must_suit_the_operator() {
        assert!(normalize(json!(["=", 1, null])).is_ok());
        assert!(normalize(json!(["<", 1, null])).is_err());
        assert!(normalize(json!(["=", 1, [1, 2]])).is_err());
        let err = normalize(json!(["contains", 1, 5])).unwrap_err();
        assert_eq!(err.path(), "/filter/2");
    }

    #[test]
    fn strict_mode_rejects_legacy_spellings() {
        assert!(validate_clause(&json!(["=", 1, 5]), "").is_err());
        assert!(validate_clause(&json!(["IS-NULL", ["field", 1, null]]), "").is_err());
        assert!(validate_clause(&json!(["and", ["is-null", ["field", 1, null]]]), "").is_err());
    }

    #[test]
    fn parsed_clauses_expose_structure() {
        let clause = Clause::parse(&json!(["between", ["field", "age", null], 18, 65])).unwrap();
        match clause {
            Clause::Compare { op, field, values } => {
                assert_eq!(op, CompareOp::Between);
                assert_eq!(field.id, FieldId::Name("age".to_string()));
                assert_eq!(values, vec![json!(18), json!(65)]);
            }
            other => panic!("unexpected clause {other:?}"),
        }
    }
}

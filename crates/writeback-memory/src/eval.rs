//! Filter evaluation over in-memory rows.

use crate::error::MemoryError;
use crate::tables::Table;
use serde_json::{Map, Number, Value};
use std::cmp::Ordering;
use writeback_query::{Clause, CompareOp, FieldRef, StringOp};

/// Whether `row` of `table` satisfies `clause`.
pub fn matches(clause: &Clause, row: &Map<String, Value>, table: &Table) -> Result<bool, MemoryError> {
    let result = match clause {
        Clause::And(clauses) => {
            for clause in clauses {
                if !matches(clause, row, table)? {
                    return Ok(false);
                }
            }
            true
        }
        Clause::Or(clauses) => {
            for clause in clauses {
                if matches(clause, row, table)? {
                    return Ok(true);
                }
            }
            false
        }
        Clause::Not(inner) => !matches(inner, row, table)?,
        Clause::IsNull(field) => lookup(row, table, field)?.is_null(),
        Clause::NotNull(field) => !lookup(row, table, field)?.is_null(),
        Clause::Compare { op, field, values } => {
            let actual = lookup(row, table, field)?;
            compare(*op, actual, values)
        }
        Clause::Match { op, field, pattern } => {
            let Value::String(actual) = lookup(row, table, field)? else {
                return Ok(*op == StringOp::DoesNotContain);
            };
            string_match(*op, actual, pattern, case_sensitive(field))
        }
    };
    Ok(result)
}

const NULL: Value = Value::Null;

fn lookup<'a>(
    row: &'a Map<String, Value>,
    table: &Table,
    field: &FieldRef,
) -> Result<&'a Value, MemoryError> {
    let column = table.column_for(field)?;
    Ok(row.get(column).unwrap_or(&NULL))
}

fn compare(op: CompareOp, actual: &Value, values: &[Value]) -> bool {
    match op {
        CompareOp::Eq => values.iter().any(|v| scalar_eq(actual, v)),
        CompareOp::Ne => values.iter().all(|v| !scalar_eq(actual, v)),
        CompareOp::Lt => order(actual, &values[0]) == Some(Ordering::Less),
        CompareOp::Le => matches!(
            order(actual, &values[0]),
            Some(Ordering::Less | Ordering::Equal)
        ),
        CompareOp::Gt => order(actual, &values[0]) == Some(Ordering::Greater),
        CompareOp::Ge => matches!(
            order(actual, &values[0]),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        CompareOp::Between => {
            matches!(
                order(actual, &values[0]),
                Some(Ordering::Greater | Ordering::Equal)
            ) && matches!(
                order(actual, &values[1]),
                Some(Ordering::Less | Ordering::Equal)
            )
        }
    }
}

/// Equality with numbers compared by value (`1 == 1.0`).
fn scalar_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => number_order(x, y) == Some(Ordering::Equal),
        _ => a == b,
    }
}

/// Ordering between two numbers or two strings; anything else is unordered.
fn order(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => number_order(x, y),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Integers compare exactly; `f64` only when either side is a float.
fn number_order(x: &Number, y: &Number) -> Option<Ordering> {
    match (integer(x), integer(y)) {
        (Some(x), Some(y)) => Some(x.cmp(&y)),
        _ => x.as_f64()?.partial_cmp(&y.as_f64()?),
    }
}

fn integer(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

fn case_sensitive(field: &FieldRef) -> bool {
    field
        .options
        .as_ref()
        .and_then(|options| options.get("case-sensitive"))
        .and_then(Value::as_bool)
        .unwrap_or(true)
}

fn string_match(op: StringOp, actual: &str, pattern: &str, case_sensitive: bool) -> bool {
    let (actual, pattern) = if case_sensitive {
        (actual.to_string(), pattern.to_string())
    } else {
        (actual.to_lowercase(), pattern.to_lowercase())
    };
    match op {
        StringOp::Contains => actual.contains(&pattern),
        StringOp::DoesNotContain => !actual.contains(&pattern),
        StringOp::StartsWith => actual.starts_with(&pattern),
        StringOp::EndsWith => actual.ends_with(&pattern),
    }
}

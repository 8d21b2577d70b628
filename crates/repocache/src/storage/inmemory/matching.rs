//! Pure row-matching functions for the in-memory store.
//!
//! Rows are JSON objects. Query-by-example treats default values (`null`,
//! `false`, `0`, `""`, empty arrays and objects) as "not part of the
//! condition", so a zero-value instance with only its key set matches by key.

use std::cmp::Ordering;

use serde_json::{Number, Value};

use repocache_core::query::{
    like_matches, Direction, Op, Predicate, ReduceCondition, ReduceKind, Row, Sort,
};

/// Returns true when a value is the zero value of its JSON kind.
pub(super) fn is_default(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Extracts the non-default fields of an example.
pub(super) fn example_fields(example: &Value) -> Vec<(String, Value)> {
    match example {
        Value::Object(map) => map
            .iter()
            .filter(|(_, v)| !is_default(v))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        _ => Vec::new(),
    }
}

/// Checks a row against example fields.
pub(super) fn matches_example(row: &Value, fields: &[(String, Value)]) -> bool {
    fields
        .iter()
        .all(|(property, expected)| row.get(property) == Some(expected))
}

/// Checks a row against every predicate.
pub(super) fn matches_all(row: &Value, predicates: &[Predicate]) -> bool {
    predicates.iter().all(|p| matches_predicate(row, p))
}

fn matches_predicate(row: &Value, predicate: &Predicate) -> bool {
    let actual = row.get(&predicate.property).unwrap_or(&Value::Null);
    match predicate.op {
        Op::Eq => values_equal(actual, &predicate.value),
        Op::Ne => !values_equal(actual, &predicate.value),
        Op::Gt => compare(actual, &predicate.value) == Some(Ordering::Greater),
        Op::Ge => matches!(
            compare(actual, &predicate.value),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Op::Lt => compare(actual, &predicate.value) == Some(Ordering::Less),
        Op::Le => matches!(
            compare(actual, &predicate.value),
            Some(Ordering::Less | Ordering::Equal)
        ),
        Op::Like => match (actual, &predicate.value) {
            (Value::String(text), Value::String(pattern)) => like_matches(pattern, text),
            _ => false,
        },
        Op::In => match &predicate.value {
            Value::Array(candidates) => candidates.iter().any(|c| values_equal(actual, c)),
            _ => false,
        },
    }
}

/// Equality that treats `1` and `1.0` as the same number.
pub(super) fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Orders two values of the same JSON kind; mixed kinds are unordered.
pub(super) fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

/// Stable multi-key sort; unordered pairs keep their relative order.
pub(super) fn sort_rows(rows: &mut [Value], sorts: &[Sort]) {
    if sorts.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        for sort in sorts {
            let left = a.get(&sort.property).unwrap_or(&Value::Null);
            let right = b.get(&sort.property).unwrap_or(&Value::Null);
            let ordering = compare(left, right).unwrap_or(Ordering::Equal);
            let ordering = match sort.direction {
                Direction::Asc => ordering,
                Direction::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

/// Keeps only the listed columns; an empty list keeps the whole row.
pub(super) fn project(row: &Value, columns: &[String]) -> Row {
    let Value::Object(map) = row else {
        return Row::new();
    };
    if columns.is_empty() {
        return map.clone();
    }
    columns
        .iter()
        .filter_map(|c| map.get(c).map(|v| (c.clone(), v.clone())))
        .collect()
}

/// Writes `updates` over the row's fields.
pub(super) fn merge(row: &mut Value, updates: impl IntoIterator<Item = (String, Value)>) {
    if let Value::Object(map) = row {
        for (property, value) in updates {
            map.insert(property, value);
        }
    }
}

/// Computes an aggregate over already-filtered rows.
pub(super) fn reduce(rows: &[&Value], reduce: &ReduceCondition) -> Value {
    let values = || {
        rows.iter().filter_map(|row| {
            reduce
                .property
                .as_ref()
                .and_then(|p| row.get(p))
                .filter(|v| !v.is_null())
        })
    };

    match reduce.kind {
        ReduceKind::Count => Value::from(rows.len() as u64),
        ReduceKind::Sum => {
            let numbers: Vec<&Number> = values()
                .filter_map(|v| match v {
                    Value::Number(n) => Some(n),
                    _ => None,
                })
                .collect();
            if numbers.iter().all(|n| n.is_i64()) {
                Value::from(numbers.iter().filter_map(|n| n.as_i64()).sum::<i64>())
            } else {
                Number::from_f64(numbers.iter().filter_map(|n| n.as_f64()).sum::<f64>())
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        ReduceKind::Max => values()
            .max_by(|a, b| compare(a, b).unwrap_or(Ordering::Equal))
            .cloned()
            .unwrap_or(Value::Null),
        ReduceKind::Min => values()
            .min_by(|a, b| compare(a, b).unwrap_or(Ordering::Equal))
            .cloned()
            .unwrap_or(Value::Null),
    }
}

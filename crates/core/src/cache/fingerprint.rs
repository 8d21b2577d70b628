//! Deterministic query fingerprints.
//!
//! A fingerprint names the cache slot of a query result. Every rule goes
//! through [`canonical_json`], so two logically identical queries always map
//! to the same slot.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use super::SerializationError;
use crate::query::{Condition, Criteria, Direction, InCondition, RawStatement};

/// Identity of a query's cached result slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint of a query-by-example condition.
    pub fn example<T: Serialize>(condition: &T) -> Result<Self, SerializationError> {
        Ok(Self(format!("example:{}", to_canonical(condition)?)))
    }

    /// Fingerprint of a single-result lookup, optionally ordered.
    pub fn one<T: Serialize>(
        condition: &T,
        order: Option<(&str, Direction)>,
    ) -> Result<Self, SerializationError> {
        let mut fingerprint = format!("one:{}", to_canonical(condition)?);
        if let Some((field, direction)) = order {
            fingerprint.push_str(&format!(":{}:{}", field, direction));
        }
        Ok(Self(fingerprint))
    }

    /// Fingerprint of structured criteria, pagination included.
    pub fn criteria(criteria: &Criteria) -> Result<Self, SerializationError> {
        Ok(Self(format!("criteria:{}", to_canonical(criteria)?)))
    }

    /// Fingerprint of the whole type.
    pub fn all() -> Self {
        Self("all".to_string())
    }

    /// Fingerprint of an IN condition, independent of value order.
    pub fn in_condition(condition: &InCondition) -> Self {
        let mut values: Vec<String> = condition.values.iter().map(canonical_json).collect();
        values.sort();
        Self(format!(
            "in:{}:[{}]",
            condition.property,
            values.join(",")
        ))
    }

    /// Fingerprint of a raw statement; parameter order is significant.
    pub fn raw(statement: &RawStatement) -> Self {
        let params = canonical_json(&Value::Array(statement.params.clone()));
        Self(format!("raw:{}:{}", statement.sql, params))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<T: Serialize> Condition<T> {
    /// Derives the fingerprint of this condition according to its variant.
    pub fn fingerprint(&self) -> Result<Fingerprint, SerializationError> {
        match self {
            Condition::Example(example) => Fingerprint::example(example),
            Condition::Criteria(criteria) => Fingerprint::criteria(criteria),
            Condition::All => Ok(Fingerprint::all()),
            Condition::In(condition) => Ok(Fingerprint::in_condition(condition)),
            Condition::Raw(statement) => Ok(Fingerprint::raw(statement)),
        }
    }
}

fn to_canonical<T: Serialize>(value: &T) -> Result<String, SerializationError> {
    serde_json::to_value(value)
        .map(|v| canonical_json(&v))
        .map_err(|e| SerializationError::SerializeFailed(e.to_string()))
}

/// Renders JSON with object keys sorted at every depth.
///
/// The output does not depend on serde_json's `preserve_order` feature.
///
/// ```
/// use repocache_core::cache::canonical_json;
/// use serde_json::json;
///
/// assert_eq!(
///     canonical_json(&json!({"b": 1, "a": {"d": null, "c": [2, 1]}})),
///     r#"{"a":{"c":[2,1],"d":null},"b":1}"#
/// );
/// ```
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(item, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

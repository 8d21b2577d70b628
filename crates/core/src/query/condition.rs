use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Criteria, Predicate};

/// A loosely typed result row.
pub type Row = Map<String, Value>;

/// The shapes of query a repository read accepts.
///
/// Each variant has its own [`Fingerprint`](crate::cache::Fingerprint) rule
/// and its own store call.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition<T> {
    /// Query by example: every non-default field of the instance must match.
    Example(T),
    /// Structured criteria.
    Criteria(Criteria),
    /// Every instance of the type.
    All,
    /// Membership of one property in a value set.
    In(InCondition),
    /// A raw statement with positional parameters.
    Raw(RawStatement),
}

impl<T> Condition<T> {
    /// Short label for logs and usage errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Condition::Example(_) => "example",
            Condition::Criteria(_) => "criteria",
            Condition::All => "all",
            Condition::In(_) => "in",
            Condition::Raw(_) => "raw",
        }
    }
}

/// `property IN (values...)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InCondition {
    pub property: String,
    pub values: Vec<Value>,
}

impl InCondition {
    pub fn new<I, V>(property: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            property: property.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Drops null and duplicate values, keeping first occurrences in order.
    ///
    /// Returns `None` when no value survives.
    ///
    /// ```
    /// use repocache_core::query::InCondition;
    /// use serde_json::{json, Value};
    ///
    /// let cond = InCondition::new("id", vec![json!(1), Value::Null, json!(2), json!(1)]);
    /// assert_eq!(cond.normalized().unwrap().values, vec![json!(1), json!(2)]);
    ///
    /// let empty = InCondition::new("id", vec![Value::Null]);
    /// assert!(empty.normalized().is_none());
    /// ```
    pub fn normalized(self) -> Option<Self> {
        let mut values: Vec<Value> = Vec::with_capacity(self.values.len());
        for value in self.values {
            if value.is_null() || values.contains(&value) {
                continue;
            }
            values.push(value);
        }
        if values.is_empty() {
            return None;
        }
        Some(Self {
            property: self.property,
            values,
        })
    }
}

/// A raw statement with positional parameters, executed by the store as is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl RawStatement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn bind(mut self, param: impl Into<Value>) -> Self {
        self.params.push(param.into());
        self
    }
}

/// A conditioned update: `updates` applied to every row matching `filter`.
///
/// `target` names the single object being updated, when the caller knows it;
/// it decides how precisely the cache is invalidated.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshCondition<T> {
    pub updates: Row,
    pub filter: Vec<Predicate>,
    pub target: Option<T>,
}

impl<T> Default for RefreshCondition<T> {
    fn default() -> Self {
        Self {
            updates: Row::new(),
            filter: Vec::new(),
            target: None,
        }
    }
}

impl<T> RefreshCondition<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, property: impl Into<String>, value: impl Into<Value>) -> Self {
        self.updates.insert(property.into(), value.into());
        self
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filter.push(predicate);
        self
    }

    pub fn target(mut self, target: T) -> Self {
        self.target = Some(target);
        self
    }
}

/// Aggregate function of a [`ReduceCondition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReduceKind {
    Count,
    Sum,
    Max,
    Min,
}

/// An aggregate over the rows matching `filter`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReduceCondition {
    pub kind: ReduceKind,
    /// Aggregated property; ignored by `Count`.
    pub property: Option<String>,
    pub filter: Vec<Predicate>,
}

impl ReduceCondition {
    pub fn count() -> Self {
        Self {
            kind: ReduceKind::Count,
            property: None,
            filter: Vec::new(),
        }
    }

    pub fn of(kind: ReduceKind, property: impl Into<String>) -> Self {
        Self {
            kind,
            property: Some(property.into()),
            filter: Vec::new(),
        }
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filter.push(predicate);
        self
    }
}

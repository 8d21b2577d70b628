use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Asc => f.write_str("ASC"),
            Direction::Desc => f.write_str("DESC"),
        }
    }
}

/// Comparison operator of a [`Predicate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Op {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    /// SQL `LIKE` with `%` wildcards.
    Like,
    /// Membership in a JSON array value.
    In,
}

/// A single `property <op> value` test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub property: String,
    pub op: Op,
    pub value: Value,
}

impl Predicate {
    pub fn new(property: impl Into<String>, op: Op, value: impl Into<Value>) -> Self {
        Self {
            property: property.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(property, Op::Eq, value)
    }

    pub fn ne(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(property, Op::Ne, value)
    }

    pub fn gt(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(property, Op::Gt, value)
    }

    pub fn lt(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(property, Op::Lt, value)
    }

    pub fn like(property: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(property, Op::Like, Value::String(pattern.into()))
    }
}

/// One ordering term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub property: String,
    pub direction: Direction,
}

/// Offset/size window of a paginated query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub offset: u64,
    pub size: u64,
}

/// Structured query criteria: AND-ed predicates, ordering and pagination.
///
/// Built with the chained methods:
///
/// ```
/// use repocache_core::query::{Criteria, Direction, Predicate};
///
/// let criteria = Criteria::new()
///     .and(Predicate::eq("status", "open"))
///     .order_by("id", Direction::Desc)
///     .paginate(0, 20);
///
/// assert_eq!(criteria.predicates.len(), 1);
/// assert_eq!(criteria.pagination.map(|p| p.size), Some(20));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Criteria {
    pub predicates: Vec<Predicate>,
    pub sorts: Vec<Sort>,
    pub pagination: Option<Pagination>,
    /// Projected columns for result-mapped reads; empty means all columns.
    pub columns: Vec<String>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn order_by(mut self, property: impl Into<String>, direction: Direction) -> Self {
        self.sorts.push(Sort {
            property: property.into(),
            direction,
        });
        self
    }

    pub fn paginate(mut self, offset: u64, size: u64) -> Self {
        self.pagination = Some(Pagination { offset, size });
        self
    }

    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }
}

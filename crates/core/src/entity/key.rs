use std::fmt;

use serde::{Deserialize, Serialize};

/// The value kind of an entity's primary-key field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyKind {
    Text,
    Integral,
}

/// A typed primary-key value.
///
/// The [`Display`](fmt::Display) form is the entity's cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimaryKey {
    Integral(i64),
    Text(String),
}

impl PrimaryKey {
    /// Returns the kind of this key value.
    pub fn kind(&self) -> KeyKind {
        match self {
            PrimaryKey::Text(_) => KeyKind::Text,
            PrimaryKey::Integral(_) => KeyKind::Integral,
        }
    }

    /// Parses a cache key back into a typed key of the given kind.
    ///
    /// Returns `None` when an integral key is not a valid `i64`.
    ///
    /// # Examples
    ///
    /// ```
    /// use repocache_core::entity::{KeyKind, PrimaryKey};
    ///
    /// assert_eq!(PrimaryKey::parse(KeyKind::Integral, "42"), Some(PrimaryKey::Integral(42)));
    /// assert_eq!(PrimaryKey::parse(KeyKind::Integral, "x"), None);
    /// assert_eq!(
    ///     PrimaryKey::parse(KeyKind::Text, "x"),
    ///     Some(PrimaryKey::Text("x".to_string()))
    /// );
    /// ```
    pub fn parse(kind: KeyKind, key: &str) -> Option<Self> {
        match kind {
            KeyKind::Text => Some(PrimaryKey::Text(key.to_string())),
            KeyKind::Integral => key.parse().ok().map(PrimaryKey::Integral),
        }
    }

    /// Returns true for the zero value of the key's kind (`0` or `""`).
    ///
    /// Stores use this to decide whether a key still has to be generated.
    pub fn is_unassigned(&self) -> bool {
        match self {
            PrimaryKey::Text(s) => s.is_empty(),
            PrimaryKey::Integral(n) => *n == 0,
        }
    }
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimaryKey::Text(s) => f.write_str(s),
            PrimaryKey::Integral(n) => write!(f, "{}", n),
        }
    }
}

impl From<i64> for PrimaryKey {
    fn from(value: i64) -> Self {
        PrimaryKey::Integral(value)
    }
}

impl From<&str> for PrimaryKey {
    fn from(value: &str) -> Self {
        PrimaryKey::Text(value.to_string())
    }
}

impl From<String> for PrimaryKey {
    fn from(value: String) -> Self {
        PrimaryKey::Text(value)
    }
}

//! Entity types shared by the crate's tests.

use serde::{Deserialize, Serialize};

use repocache_core::entity::{Entity, EntityDescriptor, KeyKind, PrimaryKey};

/// Numeric-keyed entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub status: String,
    pub customer: String,
    pub total: i64,
}

impl Order {
    pub fn new(id: i64, status: &str, total: i64) -> Self {
        Self {
            id,
            status: status.to_string(),
            customer: format!("customer-{}", id),
            total,
        }
    }

    pub fn with_status(status: &str) -> Self {
        Self {
            status: status.to_string(),
            ..Self::default()
        }
    }
}

impl Entity for Order {
    fn descriptor() -> EntityDescriptor<Self> {
        EntityDescriptor::new(
            "Order",
            "id",
            KeyKind::Integral,
            |o| Some(PrimaryKey::Integral(o.id)),
            |o, key| {
                if let PrimaryKey::Integral(id) = key {
                    o.id = id;
                }
            },
        )
    }
}

/// Text-keyed entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sku {
    pub code: String,
    pub name: String,
    pub stock: i64,
}

impl Sku {
    pub fn new(code: &str, name: &str, stock: i64) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            stock,
        }
    }
}

impl Entity for Sku {
    fn descriptor() -> EntityDescriptor<Self> {
        EntityDescriptor::new(
            "Sku",
            "code",
            KeyKind::Text,
            |s| Some(PrimaryKey::Text(s.code.clone())),
            |s, key| s.code = key.to_string(),
        )
    }
}

/// Entity opted out of caching by its own descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: i64,
    pub message: String,
}

impl Entity for AuditLog {
    fn descriptor() -> EntityDescriptor<Self> {
        EntityDescriptor::new(
            "AuditLog",
            "id",
            KeyKind::Integral,
            |a: &AuditLog| Some(PrimaryKey::Integral(a.id)),
            |a: &mut AuditLog, key| {
                if let PrimaryKey::Integral(id) = key {
                    a.id = id;
                }
            },
        )
        .with_no_cache(true)
    }
}

/// Entity whose key is optional, so key derivation can fail.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub id: Option<i64>,
    pub title: String,
}

impl Entity for Draft {
    fn descriptor() -> EntityDescriptor<Self> {
        EntityDescriptor::new(
            "Draft",
            "id",
            KeyKind::Integral,
            |d| d.id.map(PrimaryKey::Integral),
            |d, key| {
                if let PrimaryKey::Integral(id) = key {
                    d.id = Some(id);
                }
            },
        )
    }
}

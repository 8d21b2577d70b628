//! Slot key builders shared by cache backends.

use super::Fingerprint;

/// Returns the slot key of a single object.
pub fn object_key(type_name: &str, key: &str) -> String {
    format!("object:{}:{}", type_name, key)
}

/// Returns the slot key of a query key list within a type generation.
pub fn key_list_key(type_name: &str, generation: u64, fingerprint: &Fingerprint) -> String {
    format!("keys:{}:{}:{}", type_name, generation, fingerprint)
}

/// Returns the slot key of a paginated key list within a type generation.
pub fn page_key(type_name: &str, generation: u64, fingerprint: &Fingerprint) -> String {
    format!("page:{}:{}:{}", type_name, generation, fingerprint)
}

/// Returns the slot key of raw rows within a type generation.
pub fn rows_key(type_name: &str, generation: u64, fingerprint: &Fingerprint) -> String {
    format!("rows:{}:{}:{}", type_name, generation, fingerprint)
}

mod error;
mod fingerprint;
mod key_list;
mod keys;
mod serialization;
mod traits;

pub use error::{CacheError, Result};
pub use fingerprint::{canonical_json, Fingerprint};
pub use key_list::{derive_key_list, sort_by_key_list, CacheKey, KeyList, PageResult};
pub use keys::{key_list_key, object_key, page_key, rows_key};
pub use serialization::{
    deserialize_key_list, deserialize_page, deserialize_rows, deserialize_slot,
    serialize_key_list, serialize_page, serialize_rows, serialize_slot, SerializationError,
};
pub use traits::Cache;

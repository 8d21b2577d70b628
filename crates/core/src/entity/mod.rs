mod catalog;
mod descriptor;
mod key;

pub use catalog::MetadataCatalog;
pub use descriptor::{Entity, EntityDescriptor};
pub use key::{KeyKind, PrimaryKey};

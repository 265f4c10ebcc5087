mod descriptor;
mod error;
mod store;

pub use descriptor::{FieldDescriptor, FieldValue, is_empty_value};
pub use error::UnknownField;
pub use store::{FieldValueStore, FieldsByName, PatchMergePolicy};

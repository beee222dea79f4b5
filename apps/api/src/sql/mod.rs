pub mod partial_update;
pub mod table;

pub use partial_update::{FieldSet, PartialUpdateError};
pub use table::Table;

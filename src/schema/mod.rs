pub mod catalog;
pub mod types;
pub mod validation;
pub mod value;

pub use catalog::{Schema, SchemaCatalog, EDGES_TYPE};
pub use types::{Cardinality, ConnectionDef, FieldDef, FieldKind, IndexDef, TypeDef, ID_FIELD};
pub use validation::{validate_data, WriteMode};
pub use value::{FieldValue, Fields};

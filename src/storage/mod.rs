pub mod memory;
pub mod record;

pub use memory::MemoryStore;
pub use record::{Filters, Record};

use crate::error::DbResult;
use crate::schema::value::Fields;

/// Persistence collaborator for node type instances.
///
/// The engine validates every payload against the catalog before calling
/// the store, so implementations only deal with already-coerced values.
pub trait RecordStore: Send + Sync {
    /// Store a new record and return its id
    fn insert(&self, type_name: &str, fields: Fields) -> DbResult<String>;

    /// Merge `fields` into an existing record.
    /// Fails with `RecordNotFound` if the record does not exist.
    fn update(&self, type_name: &str, id: &str, fields: Fields) -> DbResult<()>;

    /// Fails with `RecordNotFound` if the record does not exist.
    fn delete(&self, type_name: &str, id: &str) -> DbResult<()>;

    fn get(&self, type_name: &str, id: &str) -> DbResult<Option<Record>>;

    /// All records of a type matching `filters`, in insertion order
    fn list(&self, type_name: &str, filters: &Filters) -> DbResult<Vec<Record>>;

    /// Forget every record of a deleted type
    fn drop_type(&self, type_name: &str) -> DbResult<()>;

    /// Strip a deleted field from every record of a type
    fn remove_field(&self, type_name: &str, field: &str) -> DbResult<()>;
}

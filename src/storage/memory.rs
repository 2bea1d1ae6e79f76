use std::collections::HashMap;

use indexmap::IndexMap;
use parking_lot::RwLock;

use super::record::{Filters, Record};
use super::RecordStore;
use crate::error::{DbError, DbResult};
use crate::schema::value::Fields;

/// In-process record store keeping every type's records in insertion order
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, IndexMap<String, Record>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records stored for a type
    pub fn count(&self, type_name: &str) -> usize {
        self.tables
            .read()
            .get(type_name)
            .map(IndexMap::len)
            .unwrap_or(0)
    }

    fn not_found(type_name: &str, id: &str) -> DbError {
        DbError::RecordNotFound {
            type_name: type_name.to_string(),
            id: id.to_string(),
        }
    }
}

impl RecordStore for MemoryStore {
    fn insert(&self, type_name: &str, fields: Fields) -> DbResult<String> {
        let record = Record::new(type_name, fields);
        let id = record.id.clone();

        self.tables
            .write()
            .entry(type_name.to_string())
            .or_default()
            .insert(id.clone(), record);

        tracing::debug!(type_name = %type_name, id = %id, "Inserted record");
        Ok(id)
    }

    fn update(&self, type_name: &str, id: &str, fields: Fields) -> DbResult<()> {
        let mut tables = self.tables.write();
        let record = tables
            .get_mut(type_name)
            .and_then(|table| table.get_mut(id))
            .ok_or_else(|| Self::not_found(type_name, id))?;
        record.merge(fields);

        tracing::debug!(type_name = %type_name, id = %id, "Updated record");
        Ok(())
    }

    fn delete(&self, type_name: &str, id: &str) -> DbResult<()> {
        self.tables
            .write()
            .get_mut(type_name)
            .and_then(|table| table.shift_remove(id))
            .ok_or_else(|| Self::not_found(type_name, id))?;

        tracing::debug!(type_name = %type_name, id = %id, "Deleted record");
        Ok(())
    }

    fn get(&self, type_name: &str, id: &str) -> DbResult<Option<Record>> {
        Ok(self
            .tables
            .read()
            .get(type_name)
            .and_then(|table| table.get(id))
            .cloned())
    }

    fn list(&self, type_name: &str, filters: &Filters) -> DbResult<Vec<Record>> {
        Ok(self
            .tables
            .read()
            .get(type_name)
            .map(|table| {
                table
                    .values()
                    .filter(|record| filters.matches(record))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn drop_type(&self, type_name: &str) -> DbResult<()> {
        if let Some(table) = self.tables.write().remove(type_name) {
            tracing::debug!(type_name = %type_name, records = table.len(), "Dropped records");
        }
        Ok(())
    }

    fn remove_field(&self, type_name: &str, field: &str) -> DbResult<()> {
        let mut tables = self.tables.write();
        let Some(table) = tables.get_mut(type_name) else {
            return Ok(());
        };

        let mut stripped = 0;
        for record in table.values_mut() {
            if record.fields.shift_remove(field).is_some() {
                stripped += 1;
            }
        }

        tracing::debug!(type_name = %type_name, field = %field, stripped, "Removed field from records");
        Ok(())
    }
}

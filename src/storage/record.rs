use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::schema::types::ID_FIELD;
use crate::schema::value::{FieldValue, Fields};

/// A stored instance of a node type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// Unique id within the type
    pub id: String,

    /// Owning node type
    #[serde(skip)]
    pub type_name: String,

    /// Stored field values, in the type's field order
    #[serde(flatten)]
    pub fields: Fields,
}

impl Record {
    /// Create a record with a freshly generated, time-ordered id
    pub fn new(type_name: &str, fields: Fields) -> Self {
        let id = Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext)).to_string();
        Self::with_id(type_name, id, fields)
    }

    pub fn with_id(type_name: &str, id: String, mut fields: Fields) -> Self {
        fields.shift_remove(ID_FIELD);
        Self {
            id,
            type_name: type_name.to_string(),
            fields,
        }
    }

    /// Overwrite the supplied fields, keeping the rest
    pub fn merge(&mut self, fields: Fields) {
        for (key, value) in fields {
            if key != ID_FIELD {
                self.fields.insert(key, value);
            }
        }
    }

    /// Get a field from the record, `id` included
    pub fn get(&self, field: &str) -> Option<Value> {
        match field {
            ID_FIELD => Some(Value::String(self.id.clone())),
            _ => self.fields.get(field).map(FieldValue::to_json),
        }
    }

    /// Convert to JSON value including the id
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Equality filters for `RecordStore::list`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters {
    pub equals: Vec<(String, FieldValue)>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `field == value` condition
    pub fn eq(mut self, field: impl Into<String>, value: FieldValue) -> Self {
        self.equals.push((field.into(), value));
        self
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.equals.iter().all(|(field, expected)| {
            if field == ID_FIELD {
                return expected.as_str() == Some(record.id.as_str());
            }
            record.fields.get(field) == Some(expected)
        })
    }
}

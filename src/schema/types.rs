use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::value::FieldValue;
use crate::error::DbError;

/// Name of the built-in identifier field and index on every node type
pub const ID_FIELD: &str = "id";

/// Kind of value a field holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Int,
    Float,
    Boolean,
    Datetime,
    Connection,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Int => "int",
            FieldKind::Float => "float",
            FieldKind::Boolean => "boolean",
            FieldKind::Datetime => "datetime",
            FieldKind::Connection => "connection",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(FieldKind::String),
            "int" => Ok(FieldKind::Int),
            "float" => Ok(FieldKind::Float),
            "boolean" => Ok(FieldKind::Boolean),
            "datetime" => Ok(FieldKind::Datetime),
            "connection" => Ok(FieldKind::Connection),
            other => Err(DbError::InvalidFieldKind(other.to_string())),
        }
    }
}

/// How many records one side of a connection points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    /// Stored reference to a single target record id
    One,
    /// Derived list of target records referencing this one
    Many,
}

/// Connection metadata carried by a connection field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDef {
    pub target_type: String,
    pub target_field: String,
    pub cardinality: Cardinality,
}

/// Field definition
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub built_in: bool,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<FieldValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection: Option<ConnectionDef>,
}

impl FieldDef {
    /// A plain, optional, user-defined field
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            built_in: false,
            required: false,
            default: None,
            connection: None,
        }
    }

    /// One side of a connection
    pub fn connection(
        name: impl Into<String>,
        target_type: impl Into<String>,
        target_field: impl Into<String>,
        cardinality: Cardinality,
    ) -> Self {
        Self {
            connection: Some(ConnectionDef {
                target_type: target_type.into(),
                target_field: target_field.into(),
                cardinality,
            }),
            ..Self::new(name, FieldKind::Connection)
        }
    }

    pub(crate) fn built_in_id() -> Self {
        Self {
            built_in: true,
            ..Self::new(ID_FIELD, FieldKind::String)
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_default(mut self, default: FieldValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn is_connection(&self) -> bool {
        self.connection.is_some()
    }

    /// Whether records store a value for this field
    pub fn is_stored(&self) -> bool {
        !matches!(
            self.connection,
            Some(ConnectionDef {
                cardinality: Cardinality::Many,
                ..
            })
        )
    }
}

/// Index definition
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDef {
    pub name: String,
    pub fields: Vec<String>,
    pub built_in: bool,
}

impl IndexDef {
    pub fn new(name: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            name: name.into(),
            fields,
            built_in: false,
        }
    }

    pub(crate) fn built_in_id() -> Self {
        Self {
            built_in: true,
            ..Self::new(ID_FIELD, vec![ID_FIELD.to_string()])
        }
    }

    pub fn covers(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }
}

/// Type definition in the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    pub name: String,
    pub is_node: bool,
    pub fields: IndexMap<String, FieldDef>,
    pub indexes: IndexMap<String, IndexDef>,
}

impl TypeDef {
    /// A node type with the built-in `id` field and index
    pub fn node(name: impl Into<String>) -> Self {
        let mut fields = IndexMap::new();
        fields.insert(ID_FIELD.to_string(), FieldDef::built_in_id());
        let mut indexes = IndexMap::new();
        indexes.insert(ID_FIELD.to_string(), IndexDef::built_in_id());

        Self {
            name: name.into(),
            is_node: true,
            fields,
            indexes,
        }
    }

    /// A bookkeeping type that holds no user data
    pub fn built_in(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_node: false,
            fields: IndexMap::new(),
            indexes: IndexMap::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.get(name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn index(&self, name: &str) -> Option<&IndexDef> {
        self.indexes.get(name)
    }

    pub fn connections(&self) -> impl Iterator<Item = (&FieldDef, &ConnectionDef)> {
        self.fields
            .values()
            .filter_map(|field| field.connection.as_ref().map(|conn| (field, conn)))
    }

    /// JSON description used by the `type` and `schema` root calls
    pub fn describe(&self) -> Value {
        json!({
            "name": self.name,
            "isNode": self.is_node,
            "fields": self.fields.values().collect::<Vec<_>>(),
            "indexes": self.indexes.values().collect::<Vec<_>>(),
        })
    }
}

use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use regex::Regex;

use super::types::{Cardinality, FieldDef, FieldKind, IndexDef, TypeDef};
use crate::error::{DbError, DbResult};

/// Built-in bookkeeping type for connection edges
pub const EDGES_TYPE: &str = "edges";

static TYPE_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]+$").expect("type name pattern is valid"));

static IDENTIFIER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid"));

/// The schema catalog: every type with its fields and indexes.
///
/// Each mutation checks all of its preconditions before touching anything,
/// so a failed call leaves the catalog unchanged. The `check_*` methods run
/// the same checks without mutating.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    types: IndexMap<String, TypeDef>,
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

impl Schema {
    /// Create a catalog seeded with the built-in types
    pub fn new() -> Self {
        let mut types = IndexMap::new();
        types.insert(EDGES_TYPE.to_string(), TypeDef::built_in(EDGES_TYPE));
        Self { types }
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.values()
    }

    pub fn get_type(&self, name: &str) -> DbResult<&TypeDef> {
        self.types
            .get(name)
            .ok_or_else(|| DbError::TypeNotFound(name.to_string()))
    }

    pub fn has_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Look up a type that can hold user data
    pub fn require_node(&self, name: &str) -> DbResult<&TypeDef> {
        let type_def = self.get_type(name)?;
        if !type_def.is_node {
            return Err(DbError::TypeIsNotNode(name.to_string()));
        }
        Ok(type_def)
    }

    fn require_node_mut(&mut self, name: &str) -> DbResult<&mut TypeDef> {
        self.require_node(name)?;
        self.types
            .get_mut(name)
            .ok_or_else(|| DbError::TypeNotFound(name.to_string()))
    }

    // ==================== Types ====================

    pub fn check_create_type(&self, name: &str) -> DbResult<()> {
        match self.types.get(name) {
            // Built-in names are reserved.
            Some(existing) if !existing.is_node => {
                return Err(DbError::InvalidTypeName(name.to_string()))
            }
            Some(_) => return Err(DbError::TypeAlreadyExists(name.to_string())),
            None => {}
        }
        if !TYPE_NAME_PATTERN.is_match(name) {
            return Err(DbError::InvalidTypeName(name.to_string()));
        }
        Ok(())
    }

    pub fn create_type(&mut self, name: &str) -> DbResult<&TypeDef> {
        self.check_create_type(name)?;
        tracing::info!(type_name = %name, "Created type");
        let type_def = self
            .types
            .entry(name.to_string())
            .or_insert_with(|| TypeDef::node(name));
        Ok(&*type_def)
    }

    pub fn check_delete_type(&self, name: &str) -> DbResult<()> {
        self.require_node(name).map(|_| ())
    }

    /// Remove a node type, its metadata, and the paired side of each of its
    /// connections on other types.
    pub fn delete_type(&mut self, name: &str) -> DbResult<TypeDef> {
        self.check_delete_type(name)?;

        let type_def = self
            .types
            .shift_remove(name)
            .ok_or_else(|| DbError::TypeNotFound(name.to_string()))?;

        for (_, connection) in type_def.connections() {
            if let Some(target) = self.types.get_mut(&connection.target_type) {
                target.fields.shift_remove(&connection.target_field);
                target
                    .indexes
                    .retain(|_, index| index.built_in || !index.covers(&connection.target_field));
            }
        }

        tracing::info!(type_name = %name, "Deleted type");
        Ok(type_def)
    }

    // ==================== Fields ====================

    fn check_field_name(&self, type_def: &TypeDef, field_name: &str) -> DbResult<()> {
        if !IDENTIFIER_PATTERN.is_match(field_name) {
            return Err(DbError::InvalidFieldName(field_name.to_string()));
        }
        if type_def.has_field(field_name) {
            return Err(DbError::FieldAlreadyExists {
                type_name: type_def.name.clone(),
                field: field_name.to_string(),
            });
        }
        Ok(())
    }

    pub fn check_create_field(&self, type_name: &str, field: &FieldDef) -> DbResult<()> {
        let type_def = self.require_node(type_name)?;
        self.check_field_name(type_def, &field.name)?;
        if field.kind == FieldKind::Connection || field.is_connection() {
            // Connections are installed in pairs by create_connection.
            return Err(DbError::InvalidFieldKind(FieldKind::Connection.to_string()));
        }
        Ok(())
    }

    pub fn create_field(&mut self, type_name: &str, field: FieldDef) -> DbResult<&FieldDef> {
        self.check_create_field(type_name, &field)?;
        let field = FieldDef {
            built_in: false,
            ..field
        };

        tracing::info!(
            type_name = %type_name,
            field = %field.name,
            kind = %field.kind,
            "Created field"
        );
        let type_def = self.require_node_mut(type_name)?;
        let name = field.name.clone();
        let field = type_def.fields.entry(name).or_insert(field);
        Ok(&*field)
    }

    fn existing_field<'a>(type_def: &'a TypeDef, field_name: &str) -> DbResult<&'a FieldDef> {
        type_def
            .field(field_name)
            .ok_or_else(|| DbError::FieldNotFound {
                type_name: type_def.name.clone(),
                field: field_name.to_string(),
            })
    }

    pub fn check_delete_field(&self, type_name: &str, field_name: &str) -> DbResult<()> {
        let type_def = self.require_node(type_name)?;
        let field = Self::existing_field(type_def, field_name)?;
        if field.built_in {
            return Err(DbError::FieldIsBuiltIn {
                type_name: type_name.to_string(),
                field: field_name.to_string(),
            });
        }
        if field.is_connection() {
            return Err(DbError::FieldIsConnection {
                type_name: type_name.to_string(),
                field: field_name.to_string(),
            });
        }
        Ok(())
    }

    /// Remove a plain field along with user indexes that cover it
    pub fn delete_field(&mut self, type_name: &str, field_name: &str) -> DbResult<FieldDef> {
        self.check_delete_field(type_name, field_name)?;

        let type_def = self.require_node_mut(type_name)?;
        let field = type_def
            .fields
            .shift_remove(field_name)
            .ok_or_else(|| DbError::FieldNotFound {
                type_name: type_name.to_string(),
                field: field_name.to_string(),
            })?;

        let before = type_def.indexes.len();
        type_def
            .indexes
            .retain(|_, index| index.built_in || !index.covers(field_name));
        let dropped = before - type_def.indexes.len();
        if dropped > 0 {
            tracing::info!(
                type_name = %type_name,
                field = %field_name,
                dropped,
                "Dropped indexes covering deleted field"
            );
        }

        tracing::info!(type_name = %type_name, field = %field_name, "Deleted field");
        Ok(field)
    }

    // ==================== Connections ====================

    pub fn check_create_connection(
        &self,
        type_name: &str,
        field_name: &str,
        target_type: &str,
        target_field_name: &str,
    ) -> DbResult<()> {
        let type_def = self.require_node(type_name)?;
        let target_def = self.require_node(target_type)?;

        self.check_field_name(type_def, field_name)?;
        self.check_field_name(target_def, target_field_name)?;

        if type_name == target_type && field_name == target_field_name {
            return Err(DbError::invalid_parameter(
                "targetFieldName",
                "a connection from a type to itself needs two distinct field names",
            ));
        }
        Ok(())
    }

    /// Install both sides of a connection: `field_name` on `type_name`
    /// references one `target_type` record, `target_field_name` lists the
    /// records pointing back.
    pub fn create_connection(
        &mut self,
        type_name: &str,
        field_name: &str,
        target_type: &str,
        target_field_name: &str,
        required: bool,
    ) -> DbResult<()> {
        self.check_create_connection(type_name, field_name, target_type, target_field_name)?;

        let forward =
            FieldDef::connection(field_name, target_type, target_field_name, Cardinality::One)
                .required(required);
        let backward =
            FieldDef::connection(target_field_name, type_name, field_name, Cardinality::Many);

        self.require_node_mut(type_name)?
            .fields
            .insert(field_name.to_string(), forward);
        self.require_node_mut(target_type)?
            .fields
            .insert(target_field_name.to_string(), backward);

        tracing::info!(
            type_name = %type_name,
            field = %field_name,
            target_type = %target_type,
            target_field = %target_field_name,
            "Created connection"
        );
        Ok(())
    }

    pub fn check_delete_connection(&self, type_name: &str, field_name: &str) -> DbResult<()> {
        let type_def = self.require_node(type_name)?;
        let field = Self::existing_field(type_def, field_name)?;
        if !field.is_connection() {
            return Err(DbError::FieldIsNotConnection {
                type_name: type_name.to_string(),
                field: field_name.to_string(),
            });
        }
        Ok(())
    }

    /// Remove a connection field and its pair on the target type.
    ///
    /// Returns the removed field and, when present, its pair.
    pub fn delete_connection(
        &mut self,
        type_name: &str,
        field_name: &str,
    ) -> DbResult<(FieldDef, Option<FieldDef>)> {
        self.check_delete_connection(type_name, field_name)?;

        let field = self
            .require_node_mut(type_name)?
            .fields
            .shift_remove(field_name)
            .ok_or_else(|| DbError::FieldNotFound {
                type_name: type_name.to_string(),
                field: field_name.to_string(),
            })?;

        let paired = match &field.connection {
            Some(connection) => self
                .types
                .get_mut(&connection.target_type)
                .and_then(|target| target.fields.shift_remove(&connection.target_field)),
            None => None,
        };

        // Only the stored side can be indexed.
        if let Some(owner) = self.types.get_mut(type_name) {
            owner
                .indexes
                .retain(|_, index| index.built_in || !index.covers(field_name));
        }
        if let (Some(connection), Some(paired_field)) = (&field.connection, &paired) {
            if let Some(owner) = self.types.get_mut(&connection.target_type) {
                owner
                    .indexes
                    .retain(|_, index| index.built_in || !index.covers(&paired_field.name));
            }
        }

        tracing::info!(type_name = %type_name, field = %field_name, "Deleted connection");
        Ok((field, paired))
    }

    // ==================== Indexes ====================

    pub fn check_create_index(
        &self,
        type_name: &str,
        index_name: &str,
        fields: &[String],
    ) -> DbResult<()> {
        let type_def = self.require_node(type_name)?;
        if type_def.index(index_name).is_some() {
            return Err(DbError::IndexAlreadyExists {
                type_name: type_name.to_string(),
                index: index_name.to_string(),
            });
        }
        if !IDENTIFIER_PATTERN.is_match(index_name) {
            return Err(DbError::invalid_parameter(
                "name",
                format!("\"{}\" is not a valid index name", index_name),
            ));
        }
        if fields.is_empty() {
            return Err(DbError::invalid_parameter(
                "fields",
                "an index needs at least one field",
            ));
        }
        for field in fields {
            let field_def = Self::existing_field(type_def, field)?;
            if !field_def.is_stored() {
                return Err(DbError::FieldIsConnection {
                    type_name: type_name.to_string(),
                    field: field.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn create_index(
        &mut self,
        type_name: &str,
        index_name: &str,
        fields: Vec<String>,
    ) -> DbResult<&IndexDef> {
        self.check_create_index(type_name, index_name, &fields)?;

        tracing::info!(
            type_name = %type_name,
            index = %index_name,
            fields = ?fields,
            "Created index"
        );
        let type_def = self.require_node_mut(type_name)?;
        let index = type_def
            .indexes
            .entry(index_name.to_string())
            .or_insert_with(|| IndexDef::new(index_name, fields));
        Ok(&*index)
    }

    pub fn check_delete_index(&self, type_name: &str, index_name: &str) -> DbResult<()> {
        let type_def = self.require_node(type_name)?;
        let index = type_def
            .index(index_name)
            .ok_or_else(|| DbError::IndexNotFound {
                type_name: type_name.to_string(),
                index: index_name.to_string(),
            })?;
        if index.built_in {
            return Err(DbError::IndexIsBuiltIn {
                type_name: type_name.to_string(),
                index: index_name.to_string(),
            });
        }
        Ok(())
    }

    pub fn delete_index(&mut self, type_name: &str, index_name: &str) -> DbResult<IndexDef> {
        self.check_delete_index(type_name, index_name)?;

        let index = self
            .require_node_mut(type_name)?
            .indexes
            .shift_remove(index_name)
            .ok_or_else(|| DbError::IndexNotFound {
                type_name: type_name.to_string(),
                index: index_name.to_string(),
            })?;

        tracing::info!(type_name = %type_name, index = %index_name, "Deleted index");
        Ok(index)
    }
}

/// Shared handle to the process-wide catalog.
///
/// One lock guards the whole catalog: a connection touches two types, so
/// per-type locks could not keep both sides consistent.
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    inner: Arc<RwLock<Schema>>,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_schema(schema: Schema) -> Self {
        Self {
            inner: Arc::new(RwLock::new(schema)),
        }
    }

    /// Shared access for validation and reads
    pub fn read(&self) -> RwLockReadGuard<'_, Schema> {
        self.inner.read()
    }

    /// Exclusive access for mutations
    pub fn write(&self) -> RwLockWriteGuard<'_, Schema> {
        self.inner.write()
    }

    /// Copy of the current catalog
    pub fn snapshot(&self) -> Schema {
        self.inner.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema_with_user() -> Schema {
        let mut schema = Schema::new();
        schema.create_type("User").unwrap();
        schema
            .create_field("User", FieldDef::new("handle", FieldKind::String))
            .unwrap();
        schema
    }

    #[test]
    fn test_seeded_with_edges() {
        let schema = Schema::new();
        assert!(schema.has_type(EDGES_TYPE));
        assert!(matches!(
            schema.require_node(EDGES_TYPE),
            Err(DbError::TypeIsNotNode(_))
        ));
    }

    #[test]
    fn test_create_type_checks() {
        let mut schema = schema_with_user();
        assert!(matches!(
            schema.create_type("User"),
            Err(DbError::TypeAlreadyExists(_))
        ));
        assert!(matches!(
            schema.create_type(EDGES_TYPE),
            Err(DbError::InvalidTypeName(_))
        ));
        assert!(matches!(
            schema.create_type("Foo_Bar"),
            Err(DbError::InvalidTypeName(_))
        ));
        assert!(matches!(schema.create_type(""), Err(DbError::InvalidTypeName(_))));
        assert!(schema.create_type("Micropost2").is_ok());
    }

    #[test]
    fn test_failed_mutation_leaves_catalog_unchanged() {
        let mut schema = schema_with_user();
        let before = schema.clone();

        assert!(schema
            .create_connection("User", "handle", "User", "followers", false)
            .is_err());
        assert!(schema.delete_field("User", "id").is_err());
        assert!(schema
            .create_index("User", "byMissing", vec!["missing".to_string()])
            .is_err());

        assert_eq!(schema, before);
    }

    #[test]
    fn test_connection_fields_cannot_be_created_directly() {
        let mut schema = schema_with_user();
        let err = schema
            .create_field("User", FieldDef::new("friend", FieldKind::Connection))
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidFieldKind(_)));
    }

    #[test]
    fn test_self_connection() {
        let mut schema = schema_with_user();
        schema
            .create_connection("User", "mentor", "User", "mentees", false)
            .unwrap();
        let user = schema.get_type("User").unwrap();
        assert!(user.has_field("mentor"));
        assert!(user.has_field("mentees"));

        assert!(schema
            .create_connection("User", "peer", "User", "peer", false)
            .is_err());

        schema.delete_connection("User", "mentees").unwrap();
        let user = schema.get_type("User").unwrap();
        assert!(!user.has_field("mentor"));
        assert!(!user.has_field("mentees"));
    }

    #[test]
    fn test_delete_type_removes_paired_fields() {
        let mut schema = schema_with_user();
        schema.create_type("Micropost").unwrap();
        schema
            .create_connection("Micropost", "author", "User", "microposts", true)
            .unwrap();

        schema.delete_type("Micropost").unwrap();
        assert!(!schema.has_type("Micropost"));
        assert!(!schema.get_type("User").unwrap().has_field("microposts"));
    }

    #[test]
    fn test_delete_field_drops_covering_indexes() {
        let mut schema = schema_with_user();
        schema
            .create_index("User", "byHandle", vec!["handle".to_string()])
            .unwrap();
        schema.delete_field("User", "handle").unwrap();
        let user = schema.get_type("User").unwrap();
        assert!(user.index("byHandle").is_none());
        assert!(user.index("id").is_some());
    }

    #[test]
    fn test_catalog_handle_shares_state() {
        let catalog = SchemaCatalog::new();
        let other = catalog.clone();
        catalog.write().create_type("User").unwrap();
        assert!(other.read().has_type("User"));
        assert!(other.snapshot().has_type("User"));
    }
}

//! Schema Catalog Tests
//!
//! Tests for catalog invariants across operations:
//! - Connection symmetry through create, delete and type deletion
//! - Built-in protection on every type
//! - Atomic mutations under concurrent writers

mod common;

use std::thread;

use common::test_schema;
use nodeql::schema::{Cardinality, ID_FIELD};
use nodeql::{DbError, FieldDef, FieldKind, SchemaCatalog};

#[test]
fn test_fixture_connection_is_paired() {
    let schema = test_schema();

    let author = schema.get_type("Micropost").unwrap().field("author").unwrap();
    let connection = author.connection.as_ref().unwrap();
    assert_eq!(connection.target_type, "User");
    assert_eq!(connection.target_field, "microposts");
    assert_eq!(connection.cardinality, Cardinality::One);
    assert!(author.required);

    let microposts = schema.get_type("User").unwrap().field("microposts").unwrap();
    let connection = microposts.connection.as_ref().unwrap();
    assert_eq!(connection.target_type, "Micropost");
    assert_eq!(connection.target_field, "author");
    assert_eq!(connection.cardinality, Cardinality::Many);
}

#[test]
fn test_every_connection_has_its_pair() {
    let mut schema = test_schema();
    schema.create_type("Tag").unwrap();
    schema
        .create_connection("Tag", "post", "Micropost", "tags", false)
        .unwrap();
    schema
        .create_connection("User", "mentor", "User", "mentees", false)
        .unwrap();
    schema.delete_type("Tag").unwrap();

    for type_def in schema.types() {
        for (field, connection) in type_def.connections() {
            let target = schema.get_type(&connection.target_type).unwrap();
            let pair = target
                .field(&connection.target_field)
                .and_then(|f| f.connection.as_ref())
                .unwrap_or_else(|| panic!("{}.{} has no pair", type_def.name, field.name));
            assert_eq!(pair.target_type, type_def.name);
            assert_eq!(pair.target_field, field.name);
        }
    }
    assert!(!schema.get_type("Micropost").unwrap().has_field("tags"));
}

#[test]
fn test_built_ins_are_protected_on_every_type() {
    let mut schema = test_schema();
    for type_name in ["User", "Micropost"] {
        assert!(matches!(
            schema.delete_field(type_name, ID_FIELD),
            Err(DbError::FieldIsBuiltIn { .. })
        ));
        assert!(matches!(
            schema.delete_index(type_name, ID_FIELD),
            Err(DbError::IndexIsBuiltIn { .. })
        ));
        assert!(matches!(
            schema.create_field(type_name, FieldDef::new(ID_FIELD, FieldKind::String)),
            Err(DbError::FieldAlreadyExists { .. })
        ));
    }
}

#[test]
fn test_invalid_field_names() {
    let mut schema = test_schema();
    for name in ["", "9lives", "has space", "dash-ed"] {
        assert!(matches!(
            schema.create_field("User", FieldDef::new(name, FieldKind::String)),
            Err(DbError::InvalidFieldName(_))
        ));
    }
    assert!(schema
        .create_field("User", FieldDef::new("_private", FieldKind::Boolean))
        .is_ok());
}

#[test]
fn test_concurrent_field_creation_is_atomic() {
    let catalog = SchemaCatalog::from_schema(test_schema());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let catalog = catalog.clone();
            thread::spawn(move || {
                catalog
                    .write()
                    .create_field("User", FieldDef::new("email", FieldKind::String))
                    .is_ok()
            })
        })
        .collect();

    let created = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();
    assert_eq!(created, 1);
}

#[test]
fn test_concurrent_connection_and_type_deletion() {
    for _ in 0..20 {
        let catalog = SchemaCatalog::from_schema(test_schema());
        catalog.write().create_type("Tag").unwrap();

        let connector = {
            let catalog = catalog.clone();
            thread::spawn(move || {
                let _ = catalog
                    .write()
                    .create_connection("Tag", "post", "Micropost", "tags", false);
            })
        };
        let deleter = {
            let catalog = catalog.clone();
            thread::spawn(move || {
                let _ = catalog.write().delete_type("Tag");
            })
        };
        connector.join().unwrap();
        deleter.join().unwrap();

        // Whichever ran first, no half connection remains
        let schema = catalog.read();
        assert!(!schema.has_type("Tag"));
        assert!(!schema.get_type("Micropost").unwrap().has_field("tags"));
    }
}

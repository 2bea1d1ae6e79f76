//! Record payload validation against a type's fields.

use serde_json::{Map, Value};

use super::types::TypeDef;
use super::value::{FieldValue, Fields};
use crate::error::{DbError, DbResult};

/// Whether a payload must be complete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Every required field without a default must be present
    Create,
    /// Any subset of fields may be supplied
    Update,
}

/// Check a `data` payload field by field and coerce every value to its kind.
///
/// The returned fields follow the type's field order. On create, absent
/// fields with a default get it.
pub fn validate_data(
    type_def: &TypeDef,
    data: &Map<String, Value>,
    mode: WriteMode,
) -> DbResult<Fields> {
    let mut supplied = Fields::new();

    for (key, value) in data {
        let field = type_def.field(key).ok_or_else(|| DbError::UnknownField {
            type_name: type_def.name.clone(),
            field: key.clone(),
        })?;

        if field.built_in {
            return Err(DbError::FieldIsBuiltIn {
                type_name: type_def.name.clone(),
                field: key.clone(),
            });
        }
        if !field.is_stored() {
            return Err(DbError::FieldIsConnection {
                type_name: type_def.name.clone(),
                field: key.clone(),
            });
        }

        supplied.insert(key.clone(), FieldValue::coerce(field.kind, value)?);
    }

    let mut fields = Fields::new();
    for field in type_def.fields.values() {
        if let Some(value) = supplied.shift_remove(&field.name) {
            fields.insert(field.name.clone(), value);
            continue;
        }
        if mode == WriteMode::Update || field.built_in || !field.is_stored() {
            continue;
        }
        if let Some(default) = &field.default {
            fields.insert(field.name.clone(), default.clone());
        } else if field.required {
            return Err(DbError::MissingRequiredField {
                type_name: type_def.name.clone(),
                field: field.name.clone(),
            });
        }
    }

    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::{Cardinality, FieldDef, FieldKind};
    use serde_json::json;

    fn micropost() -> TypeDef {
        let mut t = TypeDef::node("Micropost");
        for field in [
            FieldDef::new("text", FieldKind::String).required(true),
            FieldDef::new("createdAt", FieldKind::Datetime).required(true),
            FieldDef::connection("author", "User", "microposts", Cardinality::One).required(true),
            FieldDef::new("likes", FieldKind::Int).with_default(FieldValue::Int(0)),
        ] {
            t.fields.insert(field.name.clone(), field);
        }
        t
    }

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_create_fills_defaults_in_field_order() {
        let data = object(json!({
            "author": "1234",
            "text": "foo",
            "createdAt": "2014-05-18T18:00:00Z",
        }));
        let fields = validate_data(&micropost(), &data, WriteMode::Create).unwrap();
        let keys: Vec<&str> = fields.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["text", "createdAt", "author", "likes"]);
        assert_eq!(fields["likes"], FieldValue::Int(0));
        assert!(matches!(fields["createdAt"], FieldValue::DateTime(_)));
    }

    #[test]
    fn test_create_requires_fields() {
        let data = object(json!({"text": "foo", "createdAt": "2014-05-18T18:00:00Z"}));
        let err = validate_data(&micropost(), &data, WriteMode::Create).unwrap_err();
        assert!(matches!(err, DbError::MissingRequiredField { ref field, .. } if field == "author"));
    }

    #[test]
    fn test_update_allows_partial_data() {
        let data = object(json!({"text": "foo"}));
        let fields = validate_data(&micropost(), &data, WriteMode::Update).unwrap();
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn test_unknown_field() {
        let data = object(json!({"texta": "fooz"}));
        let err = validate_data(&micropost(), &data, WriteMode::Update).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Type \"Micropost\" does not have a field \"texta\""
        );
    }

    #[test]
    fn test_built_in_field_is_read_only() {
        let data = object(json!({"id": "abc"}));
        let err = validate_data(&micropost(), &data, WriteMode::Update).unwrap_err();
        assert!(matches!(err, DbError::FieldIsBuiltIn { .. }));
    }
}

//! Schema calls: create and delete types, fields, connections and indexes.
//!
//! Processing checks the catalog under the read lock. The mutation takes
//! the write lock and checks again, so it is atomic even if another
//! mutation ran in between. Values of removed fields are stripped from the
//! store before the write lock is released.

use serde_json::{json, Value};

use super::params::{boolean, optional, required, string_list};
use super::{mismatched, CallContext, CallOutput, CallParams, RootCall};
use crate::error::DbResult;
use crate::query::Parameters;
use crate::schema::{Cardinality, FieldDef, FieldKind, FieldValue, Schema};

pub const CALLS: [RootCall; 8] = [
    RootCall::new("createType", &["name"], process_create_type, call_create_type),
    RootCall::new("deleteType", &["name"], process_delete_type, call_delete_type),
    RootCall::new(
        "createField",
        &["type", "fieldName", "fieldType", "required", "default"],
        process_create_field,
        call_create_field,
    ),
    RootCall::new(
        "deleteField",
        &["type", "fieldName"],
        process_delete_field,
        call_delete_field,
    ),
    RootCall::new(
        "createConnection",
        &["type", "fieldName", "targetType", "targetFieldName", "required"],
        process_create_connection,
        call_create_connection,
    ),
    RootCall::new(
        "deleteConnection",
        &["type", "fieldName"],
        process_delete_connection,
        call_delete_connection,
    ),
    RootCall::new(
        "createIndex",
        &["type", "name", "fields"],
        process_create_index,
        call_create_index,
    ),
    RootCall::new(
        "deleteIndex",
        &["type", "name"],
        process_delete_index,
        call_delete_index,
    ),
];

fn success(type_description: Value) -> CallOutput {
    CallOutput::Json(json!({
        "success": true,
        "type": type_description,
    }))
}

// ==================== Types ====================

fn process_create_type(schema: &Schema, raw: &Parameters) -> DbResult<CallParams> {
    let name = required("createType", raw, "name")?;
    schema.check_create_type(name)?;
    Ok(CallParams::CreateType {
        name: name.to_string(),
    })
}

fn call_create_type(ctx: &CallContext, params: CallParams) -> DbResult<CallOutput> {
    let name = match params {
        CallParams::CreateType { name } => name,
        other => return Err(mismatched("createType", &other)),
    };
    let description = ctx.catalog.write().create_type(&name)?.describe();
    Ok(success(description))
}

fn process_delete_type(schema: &Schema, raw: &Parameters) -> DbResult<CallParams> {
    let name = required("deleteType", raw, "name")?;
    schema.check_delete_type(name)?;
    Ok(CallParams::DeleteType {
        name: name.to_string(),
    })
}

fn call_delete_type(ctx: &CallContext, params: CallParams) -> DbResult<CallOutput> {
    let name = match params {
        CallParams::DeleteType { name } => name,
        other => return Err(mismatched("deleteType", &other)),
    };
    let mut schema = ctx.catalog.write();
    let removed = schema.delete_type(&name)?;
    ctx.store.drop_type(&name)?;

    // A many side here pairs with a stored one side on the other type.
    for (_, connection) in removed.connections() {
        if connection.cardinality == Cardinality::Many && connection.target_type != name {
            ctx.store
                .remove_field(&connection.target_type, &connection.target_field)?;
        }
    }
    Ok(success(removed.describe()))
}

// ==================== Fields ====================

fn process_create_field(schema: &Schema, raw: &Parameters) -> DbResult<CallParams> {
    let type_name = required("createField", raw, "type")?;
    let field_name = required("createField", raw, "fieldName")?;
    let field_type = required("createField", raw, "fieldType")?;
    schema.require_node(type_name)?;

    let kind: FieldKind = field_type.parse()?;
    let mut field = FieldDef::new(field_name, kind);
    if let Some(value) = optional(raw, "required") {
        field = field.required(boolean("required", value)?);
    }
    if let Some(value) = optional(raw, "default") {
        field = field.with_default(FieldValue::coerce_str(kind, value)?);
    }

    schema.check_create_field(type_name, &field)?;
    Ok(CallParams::CreateField {
        type_name: type_name.to_string(),
        field,
    })
}

fn call_create_field(ctx: &CallContext, params: CallParams) -> DbResult<CallOutput> {
    let (type_name, field) = match params {
        CallParams::CreateField { type_name, field } => (type_name, field),
        other => return Err(mismatched("createField", &other)),
    };
    let mut schema = ctx.catalog.write();
    schema.create_field(&type_name, field)?;
    Ok(success(schema.get_type(&type_name)?.describe()))
}

fn process_delete_field(schema: &Schema, raw: &Parameters) -> DbResult<CallParams> {
    let type_name = required("deleteField", raw, "type")?;
    let field_name = required("deleteField", raw, "fieldName")?;
    schema.check_delete_field(type_name, field_name)?;
    Ok(CallParams::DeleteField {
        type_name: type_name.to_string(),
        field_name: field_name.to_string(),
    })
}

fn call_delete_field(ctx: &CallContext, params: CallParams) -> DbResult<CallOutput> {
    let (type_name, field_name) = match params {
        CallParams::DeleteField {
            type_name,
            field_name,
        } => (type_name, field_name),
        other => return Err(mismatched("deleteField", &other)),
    };
    let mut schema = ctx.catalog.write();
    schema.delete_field(&type_name, &field_name)?;
    ctx.store.remove_field(&type_name, &field_name)?;
    Ok(success(schema.get_type(&type_name)?.describe()))
}

// ==================== Connections ====================

fn connection_success(schema: &Schema, type_name: &str, target_type: &str) -> DbResult<CallOutput> {
    Ok(CallOutput::Json(json!({
        "success": true,
        "type": schema.get_type(type_name)?.describe(),
        "targetType": schema.get_type(target_type)?.describe(),
    })))
}

fn process_create_connection(schema: &Schema, raw: &Parameters) -> DbResult<CallParams> {
    let type_name = required("createConnection", raw, "type")?;
    let field_name = required("createConnection", raw, "fieldName")?;
    let target_type = required("createConnection", raw, "targetType")?;
    let target_field_name = required("createConnection", raw, "targetFieldName")?;
    let is_required = optional(raw, "required")
        .map(|value| boolean("required", value))
        .transpose()?
        .unwrap_or(false);

    schema.check_create_connection(type_name, field_name, target_type, target_field_name)?;
    Ok(CallParams::CreateConnection {
        type_name: type_name.to_string(),
        field_name: field_name.to_string(),
        target_type: target_type.to_string(),
        target_field_name: target_field_name.to_string(),
        required: is_required,
    })
}

fn call_create_connection(ctx: &CallContext, params: CallParams) -> DbResult<CallOutput> {
    let (type_name, field_name, target_type, target_field_name, required) = match params {
        CallParams::CreateConnection {
            type_name,
            field_name,
            target_type,
            target_field_name,
            required,
        } => (type_name, field_name, target_type, target_field_name, required),
        other => return Err(mismatched("createConnection", &other)),
    };
    let mut schema = ctx.catalog.write();
    schema.create_connection(
        &type_name,
        &field_name,
        &target_type,
        &target_field_name,
        required,
    )?;
    connection_success(&schema, &type_name, &target_type)
}

fn process_delete_connection(schema: &Schema, raw: &Parameters) -> DbResult<CallParams> {
    let type_name = required("deleteConnection", raw, "type")?;
    let field_name = required("deleteConnection", raw, "fieldName")?;
    schema.check_delete_connection(type_name, field_name)?;
    Ok(CallParams::DeleteConnection {
        type_name: type_name.to_string(),
        field_name: field_name.to_string(),
    })
}

fn call_delete_connection(ctx: &CallContext, params: CallParams) -> DbResult<CallOutput> {
    let (type_name, field_name) = match params {
        CallParams::DeleteConnection {
            type_name,
            field_name,
        } => (type_name, field_name),
        other => return Err(mismatched("deleteConnection", &other)),
    };
    let mut schema = ctx.catalog.write();
    let (removed, paired) = schema.delete_connection(&type_name, &field_name)?;
    let target_type = removed
        .connection
        .as_ref()
        .map(|connection| connection.target_type.clone())
        .unwrap_or_else(|| type_name.clone());

    // Only the one side holds values in records.
    if removed.is_stored() {
        ctx.store.remove_field(&type_name, &removed.name)?;
    } else if let Some(paired) = paired.filter(FieldDef::is_stored) {
        ctx.store.remove_field(&target_type, &paired.name)?;
    }
    connection_success(&schema, &type_name, &target_type)
}

// ==================== Indexes ====================

fn process_create_index(schema: &Schema, raw: &Parameters) -> DbResult<CallParams> {
    let type_name = required("createIndex", raw, "type")?;
    let name = required("createIndex", raw, "name")?;
    let fields = required("createIndex", raw, "fields")?;
    schema.require_node(type_name)?;

    let fields = string_list("fields", fields)?;
    schema.check_create_index(type_name, name, &fields)?;
    Ok(CallParams::CreateIndex {
        type_name: type_name.to_string(),
        name: name.to_string(),
        fields,
    })
}

fn call_create_index(ctx: &CallContext, params: CallParams) -> DbResult<CallOutput> {
    let (type_name, name, fields) = match params {
        CallParams::CreateIndex {
            type_name,
            name,
            fields,
        } => (type_name, name, fields),
        other => return Err(mismatched("createIndex", &other)),
    };
    let mut schema = ctx.catalog.write();
    schema.create_index(&type_name, &name, fields)?;
    Ok(success(schema.get_type(&type_name)?.describe()))
}

fn process_delete_index(schema: &Schema, raw: &Parameters) -> DbResult<CallParams> {
    let type_name = required("deleteIndex", raw, "type")?;
    let name = required("deleteIndex", raw, "name")?;
    schema.check_delete_index(type_name, name)?;
    Ok(CallParams::DeleteIndex {
        type_name: type_name.to_string(),
        name: name.to_string(),
    })
}

fn call_delete_index(ctx: &CallContext, params: CallParams) -> DbResult<CallOutput> {
    let (type_name, name) = match params {
        CallParams::DeleteIndex { type_name, name } => (type_name, name),
        other => return Err(mismatched("deleteIndex", &other)),
    };
    let mut schema = ctx.catalog.write();
    schema.delete_index(&type_name, &name)?;
    Ok(success(schema.get_type(&type_name)?.describe()))
}

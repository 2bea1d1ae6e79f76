//! Data calls: create, update, delete.

use serde_json::{Map, Value};

use super::params::{json_object, required};
use super::{mismatched, CallContext, CallOutput, CallParams, RootCall};
use crate::error::{DbError, DbResult};
use crate::query::Parameters;
use crate::schema::{validate_data, Fields, Schema, WriteMode};
use crate::storage::Record;

pub const CALLS: [RootCall; 3] = [
    RootCall::new("create", &["type", "data"], process_create, call_create),
    RootCall::new("update", &["type", "id", "data"], process_update, call_update),
    RootCall::new("delete", &["type", "id"], process_delete, call_delete),
];

/// Validate `data` against the current catalog. The read lock is released
/// before the store is touched.
fn validated(
    ctx: &CallContext,
    type_name: &str,
    data: &Map<String, Value>,
    mode: WriteMode,
) -> DbResult<Fields> {
    let schema = ctx.catalog.read();
    let type_def = schema.require_node(type_name)?;
    validate_data(type_def, data, mode)
}

fn fetch(ctx: &CallContext, type_name: &str, id: &str) -> DbResult<Record> {
    ctx.store
        .get(type_name, id)?
        .ok_or_else(|| DbError::RecordNotFound {
            type_name: type_name.to_string(),
            id: id.to_string(),
        })
}

fn process_create(schema: &Schema, raw: &Parameters) -> DbResult<CallParams> {
    let type_name = required("create", raw, "type")?;
    schema.require_node(type_name)?;
    let data = json_object("data", required("create", raw, "data")?)?;
    Ok(CallParams::Create {
        type_name: type_name.to_string(),
        data,
    })
}

fn call_create(ctx: &CallContext, params: CallParams) -> DbResult<CallOutput> {
    let (type_name, data) = match params {
        CallParams::Create { type_name, data } => (type_name, data),
        other => return Err(mismatched("create", &other)),
    };
    let fields = validated(ctx, &type_name, &data, WriteMode::Create)?;

    let id = ctx.store.insert(&type_name, fields)?;
    let record = fetch(ctx, &type_name, &id)?;
    Ok(CallOutput::Record { type_name, record })
}

fn process_update(schema: &Schema, raw: &Parameters) -> DbResult<CallParams> {
    let type_name = required("update", raw, "type")?;
    schema.require_node(type_name)?;
    let id = required("update", raw, "id")?;
    let data = json_object("data", required("update", raw, "data")?)?;
    Ok(CallParams::Update {
        type_name: type_name.to_string(),
        id: id.to_string(),
        data,
    })
}

fn call_update(ctx: &CallContext, params: CallParams) -> DbResult<CallOutput> {
    let (type_name, id, data) = match params {
        CallParams::Update {
            type_name,
            id,
            data,
        } => (type_name, id, data),
        other => return Err(mismatched("update", &other)),
    };
    let fields = validated(ctx, &type_name, &data, WriteMode::Update)?;

    ctx.store.update(&type_name, &id, fields)?;
    let record = fetch(ctx, &type_name, &id)?;
    Ok(CallOutput::Record { type_name, record })
}

fn process_delete(schema: &Schema, raw: &Parameters) -> DbResult<CallParams> {
    let type_name = required("delete", raw, "type")?;
    schema.require_node(type_name)?;
    let id = required("delete", raw, "id")?;
    Ok(CallParams::Delete {
        type_name: type_name.to_string(),
        id: id.to_string(),
    })
}

fn call_delete(ctx: &CallContext, params: CallParams) -> DbResult<CallOutput> {
    let (type_name, id) = match params {
        CallParams::Delete { type_name, id } => (type_name, id),
        other => return Err(mismatched("delete", &other)),
    };
    ctx.catalog.read().require_node(&type_name)?;

    let record = fetch(ctx, &type_name, &id)?;
    ctx.store.delete(&type_name, &id)?;
    Ok(CallOutput::Record { type_name, record })
}

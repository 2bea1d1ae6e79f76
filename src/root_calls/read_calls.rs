//! Read calls: schema, type, node, nodes.

use serde_json::{json, Value};

use super::params::{count, optional, required};
use super::{mismatched, CallContext, CallOutput, CallParams, RootCall};
use crate::config::PageLimits;
use crate::error::{DbError, DbResult};
use crate::query::Parameters;
use crate::schema::Schema;
use crate::storage::{Filters, Record};

pub const CALLS: [RootCall; 4] = [
    RootCall::new("schema", &[], process_schema, call_schema),
    RootCall::new("type", &["name"], process_type, call_type),
    RootCall::new("node", &["type", "id"], process_node, call_node),
    RootCall::new(
        "nodes",
        &["type", "first", "after"],
        process_nodes,
        call_nodes,
    ),
];

fn process_schema(_schema: &Schema, _raw: &Parameters) -> DbResult<CallParams> {
    Ok(CallParams::Schema)
}

fn call_schema(ctx: &CallContext, params: CallParams) -> DbResult<CallOutput> {
    if params != CallParams::Schema {
        return Err(mismatched("schema", &params));
    }
    let schema = ctx.catalog.read();
    let types: Vec<Value> = schema.types().map(|t| t.describe()).collect();
    Ok(CallOutput::Json(json!({ "types": types })))
}

fn process_type(schema: &Schema, raw: &Parameters) -> DbResult<CallParams> {
    let name = required("type", raw, "name")?;
    schema.get_type(name)?;
    Ok(CallParams::Type {
        name: name.to_string(),
    })
}

fn call_type(ctx: &CallContext, params: CallParams) -> DbResult<CallOutput> {
    let name = match params {
        CallParams::Type { name } => name,
        other => return Err(mismatched("type", &other)),
    };
    let description = ctx.catalog.read().get_type(&name)?.describe();
    Ok(CallOutput::Json(description))
}

fn process_node(schema: &Schema, raw: &Parameters) -> DbResult<CallParams> {
    let type_name = required("node", raw, "type")?;
    let id = required("node", raw, "id")?;
    schema.require_node(type_name)?;
    Ok(CallParams::Node {
        type_name: type_name.to_string(),
        id: id.to_string(),
    })
}

fn call_node(ctx: &CallContext, params: CallParams) -> DbResult<CallOutput> {
    let (type_name, id) = match params {
        CallParams::Node { type_name, id } => (type_name, id),
        other => return Err(mismatched("node", &other)),
    };
    ctx.catalog.read().require_node(&type_name)?;

    let record = ctx
        .store
        .get(&type_name, &id)?
        .ok_or_else(|| DbError::RecordNotFound {
            type_name: type_name.clone(),
            id,
        })?;
    Ok(CallOutput::Record { type_name, record })
}

fn process_nodes(schema: &Schema, raw: &Parameters) -> DbResult<CallParams> {
    let type_name = required("nodes", raw, "type")?;
    schema.require_node(type_name)?;

    let first = optional(raw, "first")
        .map(|value| count("first", value))
        .transpose()?;
    let after = optional(raw, "after").map(str::to_string);

    Ok(CallParams::Nodes {
        type_name: type_name.to_string(),
        first,
        after,
    })
}

fn call_nodes(ctx: &CallContext, params: CallParams) -> DbResult<CallOutput> {
    let (type_name, first, after) = match params {
        CallParams::Nodes {
            type_name,
            first,
            after,
        } => (type_name, first, after),
        other => return Err(mismatched("nodes", &other)),
    };
    ctx.catalog.read().require_node(&type_name)?;

    let records = ctx.store.list(&type_name, &Filters::new())?;
    let count = records.len();
    let records = paginate(records, first, after.as_deref(), &ctx.limits)?;

    Ok(CallOutput::Connection {
        type_name,
        count,
        records,
    })
}

/// Take one page of `records`: those after the `after` cursor, at most
/// `first` of them.
pub fn paginate(
    records: Vec<Record>,
    first: Option<usize>,
    after: Option<&str>,
    limits: &PageLimits,
) -> DbResult<Vec<Record>> {
    let start = match after {
        Some(cursor) => {
            let position = records
                .iter()
                .position(|record| record.id == cursor)
                .ok_or_else(|| {
                    DbError::invalid_parameter(
                        "after",
                        format!("no record with id \"{}\"", cursor),
                    )
                })?;
            position + 1
        }
        None => 0,
    };

    let size = limits.page_size(first);
    Ok(records.into_iter().skip(start).take(size).collect())
}

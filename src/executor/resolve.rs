//! Projection of call results through a query's child selection.

use serde_json::{Map, Value};

use crate::error::{DbError, DbResult};
use crate::query::AstNode;
use crate::root_calls::params;
use crate::root_calls::read_calls::paginate;
use crate::root_calls::{CallContext, CallOutput};
use crate::schema::{Cardinality, FieldValue, Schema};
use crate::storage::{Filters, Record};

const COUNT: &str = "count";
const NODES: &str = "nodes";

pub fn resolve_output(
    ctx: &CallContext,
    output: CallOutput,
    selection: &[AstNode],
) -> DbResult<Value> {
    match output {
        CallOutput::Json(value) => project_value(&value, selection),
        CallOutput::Record { type_name, record } => {
            let schema = ctx.catalog.read();
            resolve_record(ctx, &schema, &type_name, &record, selection)
        }
        CallOutput::Connection {
            type_name,
            count,
            records,
        } => {
            let schema = ctx.catalog.read();
            resolve_connection(ctx, &schema, &type_name, count, &records, selection)
        }
    }
}

/// Only many-side connections take parameters
fn reject_parameters(child: &AstNode) -> DbResult<()> {
    match child.parameters.keys().next() {
        Some(key) => Err(DbError::invalid_parameter(
            key,
            format!("\"{}\" does not take parameters", child.name),
        )),
        None => Ok(()),
    }
}

fn project_value(value: &Value, selection: &[AstNode]) -> DbResult<Value> {
    if selection.is_empty() {
        return Ok(value.clone());
    }

    match value {
        Value::Object(object) => {
            let mut projected = Map::new();
            for child in selection {
                reject_parameters(child)?;
                let field = object.get(&child.name).unwrap_or(&Value::Null);
                projected.insert(
                    child.output_name().to_string(),
                    project_value(field, &child.children)?,
                );
            }
            Ok(Value::Object(projected))
        }
        Value::Array(items) => items
            .iter()
            .map(|item| project_value(item, selection))
            .collect::<DbResult<Vec<_>>>()
            .map(Value::Array),
        scalar => Ok(scalar.clone()),
    }
}

fn resolve_record(
    ctx: &CallContext,
    schema: &Schema,
    type_name: &str,
    record: &Record,
    selection: &[AstNode],
) -> DbResult<Value> {
    if selection.is_empty() {
        return Ok(record.to_value());
    }

    let type_def = schema.require_node(type_name)?;
    let mut projected = Map::new();

    for child in selection {
        let field = type_def
            .field(&child.name)
            .ok_or_else(|| DbError::UnknownField {
                type_name: type_name.to_string(),
                field: child.name.clone(),
            })?;

        let value = match &field.connection {
            Some(connection) if connection.cardinality == Cardinality::Many => {
                let first = child
                    .parameter("first")
                    .map(|v| params::count("first", v))
                    .transpose()?;
                let after = child.parameter("after");
                if let Some(key) = child
                    .parameters
                    .keys()
                    .find(|key| *key != "first" && *key != "after")
                {
                    return Err(DbError::invalid_parameter(
                        key,
                        format!("\"{}\" does not take this parameter", child.name),
                    ));
                }

                let filters = Filters::new().eq(
                    connection.target_field.clone(),
                    FieldValue::Connection(record.id.clone()),
                );
                let records = ctx.store.list(&connection.target_type, &filters)?;
                let count = records.len();
                let page = paginate(records, first, after, &ctx.limits)?;
                resolve_connection(
                    ctx,
                    schema,
                    &connection.target_type,
                    count,
                    &page,
                    &child.children,
                )?
            }
            Some(connection) => {
                reject_parameters(child)?;
                let target_id = record.fields.get(&child.name).and_then(FieldValue::as_str);
                match target_id {
                    None => Value::Null,
                    Some(id) if child.is_leaf() => Value::String(id.to_string()),
                    Some(id) => match ctx.store.get(&connection.target_type, id)? {
                        Some(target) => resolve_record(
                            ctx,
                            schema,
                            &connection.target_type,
                            &target,
                            &child.children,
                        )?,
                        None => Value::Null,
                    },
                }
            }
            None => {
                reject_parameters(child)?;
                if !child.is_leaf() {
                    return Err(DbError::FieldIsNotConnection {
                        type_name: type_name.to_string(),
                        field: child.name.clone(),
                    });
                }
                record.get(&child.name).unwrap_or(Value::Null)
            }
        };

        projected.insert(child.output_name().to_string(), value);
    }

    Ok(Value::Object(projected))
}

fn resolve_connection(
    ctx: &CallContext,
    schema: &Schema,
    type_name: &str,
    count: usize,
    records: &[Record],
    selection: &[AstNode],
) -> DbResult<Value> {
    let mut projected = Map::new();

    if selection.is_empty() {
        projected.insert(COUNT.to_string(), Value::from(count));
        projected.insert(
            NODES.to_string(),
            Value::Array(records.iter().map(Record::to_value).collect()),
        );
        return Ok(Value::Object(projected));
    }

    for child in selection {
        reject_parameters(child)?;
        let value = match child.name.as_str() {
            COUNT => Value::from(count),
            NODES => records
                .iter()
                .map(|record| resolve_record(ctx, schema, type_name, record, &child.children))
                .collect::<DbResult<Vec<_>>>()
                .map(Value::Array)?,
            other => {
                return Err(DbError::UnknownField {
                    type_name: type_name.to_string(),
                    field: other.to_string(),
                })
            }
        };
        projected.insert(child.output_name().to_string(), value);
    }

    Ok(Value::Object(projected))
}

//! Decoding of raw string parameters.
//!
//! The parser leaves every parameter value as a string; structured values
//! (`data`, `fields`) travel as JSON text.

use serde_json::{Map, Value};

use crate::error::{DbError, DbResult};
use crate::query::Parameters;

pub fn required<'a>(call: &str, raw: &'a Parameters, name: &str) -> DbResult<&'a str> {
    raw.get(name)
        .map(String::as_str)
        .ok_or_else(|| DbError::MissingParameter {
            call: call.to_string(),
            parameter: name.to_string(),
        })
}

pub fn optional<'a>(raw: &'a Parameters, name: &str) -> Option<&'a str> {
    raw.get(name).map(String::as_str)
}

/// Decode a JSON object, e.g. `data: {"text": "foo"}`
pub fn json_object(parameter: &str, value: &str) -> DbResult<Map<String, Value>> {
    match serde_json::from_str::<Value>(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(DbError::invalid_parameter(parameter, "expected a JSON object")),
        Err(e) => Err(DbError::invalid_parameter(
            parameter,
            format!("invalid JSON: {}", e),
        )),
    }
}

/// Decode a JSON array of strings, e.g. `fields: ["handle"]`
pub fn string_list(parameter: &str, value: &str) -> DbResult<Vec<String>> {
    serde_json::from_str::<Vec<String>>(value).map_err(|e| {
        DbError::invalid_parameter(
            parameter,
            format!("expected a JSON array of strings: {}", e),
        )
    })
}

pub fn count(parameter: &str, value: &str) -> DbResult<usize> {
    value.parse::<usize>().map_err(|_| {
        DbError::invalid_parameter(
            parameter,
            format!("\"{}\" is not a non-negative integer", value),
        )
    })
}

pub fn boolean(parameter: &str, value: &str) -> DbResult<bool> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(DbError::invalid_parameter(
            parameter,
            format!("\"{}\" is not true or false", other),
        )),
    }
}

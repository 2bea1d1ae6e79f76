use chrono::{DateTime, NaiveDateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use super::types::FieldKind;
use crate::error::{DbError, DbResult};

/// Field values of one record, keyed by field name
pub type Fields = IndexMap<String, FieldValue>;

/// A value coerced to a field's declared kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Int(i64),
    Float(f64),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    /// Id of the connected record
    Connection(String),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::String(_) => FieldKind::String,
            FieldValue::Int(_) => FieldKind::Int,
            FieldValue::Float(_) => FieldKind::Float,
            FieldValue::Boolean(_) => FieldKind::Boolean,
            FieldValue::DateTime(_) => FieldKind::Datetime,
            FieldValue::Connection(_) => FieldKind::Connection,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) | FieldValue::Connection(s) => Some(s),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Convert a JSON value to `kind`
    pub fn coerce(kind: FieldKind, value: &Value) -> DbResult<FieldValue> {
        let converted = match (kind, value) {
            (FieldKind::String, Value::String(s)) => Some(FieldValue::String(s.clone())),

            (FieldKind::Int, Value::Number(n)) => n.as_i64().map(FieldValue::Int),
            (FieldKind::Int, Value::String(s)) => s.trim().parse().ok().map(FieldValue::Int),

            (FieldKind::Float, Value::Number(n)) => n.as_f64().map(FieldValue::Float),
            (FieldKind::Float, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(FieldValue::Float),

            (FieldKind::Boolean, Value::Bool(b)) => Some(FieldValue::Boolean(*b)),
            (FieldKind::Boolean, Value::String(s)) => match s.as_str() {
                "true" => Some(FieldValue::Boolean(true)),
                "false" => Some(FieldValue::Boolean(false)),
                _ => None,
            },

            (FieldKind::Datetime, Value::String(s)) => parse_datetime(s).map(FieldValue::DateTime),

            (FieldKind::Connection, Value::String(s)) if !s.is_empty() => {
                Some(FieldValue::Connection(s.clone()))
            }
            (FieldKind::Connection, Value::Number(n)) if n.is_i64() || n.is_u64() => {
                Some(FieldValue::Connection(n.to_string()))
            }

            _ => None,
        };

        converted.ok_or_else(|| DbError::ValueConversionError {
            value: value.to_string(),
            kind: kind.to_string(),
        })
    }

    /// Convert a raw query parameter string to `kind`
    pub fn coerce_str(kind: FieldKind, raw: &str) -> DbResult<FieldValue> {
        Self::coerce(kind, &Value::String(raw.to_string()))
    }
}

/// Parse an ISO-8601 timestamp; values without an offset are taken as UTC
fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

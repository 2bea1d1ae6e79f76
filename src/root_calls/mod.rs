//! Root calls: the named operations a query can start with.
//!
//! Every call runs in two phases:
//! - `process_parameters` decodes the raw string parameters and runs the
//!   checks that only need the catalog. It never mutates anything.
//! - `call` performs the catalog mutation or the store operation.
//!
//! Calls are grouped by category:
//! - read_calls: schema, type, node, nodes
//! - schema_calls: createType, createField, createConnection, createIndex
//!   and their delete counterparts
//! - data_calls: create, update, delete

pub mod data_calls;
pub mod params;
pub mod read_calls;
pub mod schema_calls;

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde_json::{json, Map, Value};

use crate::config::PageLimits;
use crate::error::{DbError, DbResult};
use crate::query::Parameters;
use crate::schema::{FieldDef, Schema, SchemaCatalog};
use crate::storage::{Record, RecordStore};

/// Parameters after the processing phase
#[derive(Debug, Clone, PartialEq)]
pub enum CallParams {
    Schema,
    Type {
        name: String,
    },
    Node {
        type_name: String,
        id: String,
    },
    Nodes {
        type_name: String,
        first: Option<usize>,
        after: Option<String>,
    },
    CreateType {
        name: String,
    },
    DeleteType {
        name: String,
    },
    CreateField {
        type_name: String,
        field: FieldDef,
    },
    DeleteField {
        type_name: String,
        field_name: String,
    },
    CreateConnection {
        type_name: String,
        field_name: String,
        target_type: String,
        target_field_name: String,
        required: bool,
    },
    DeleteConnection {
        type_name: String,
        field_name: String,
    },
    CreateIndex {
        type_name: String,
        name: String,
        fields: Vec<String>,
    },
    DeleteIndex {
        type_name: String,
        name: String,
    },
    Create {
        type_name: String,
        data: Map<String, Value>,
    },
    Update {
        type_name: String,
        id: String,
        data: Map<String, Value>,
    },
    Delete {
        type_name: String,
        id: String,
    },
}

/// What a call runs against
#[derive(Clone)]
pub struct CallContext {
    pub catalog: SchemaCatalog,
    pub store: Arc<dyn RecordStore>,
    pub limits: PageLimits,
}

impl CallContext {
    pub fn new(catalog: SchemaCatalog, store: Arc<dyn RecordStore>) -> Self {
        Self {
            catalog,
            store,
            limits: PageLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: PageLimits) -> Self {
        self.limits = limits;
        self
    }
}

/// Result of a call, before child selection is applied
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutput {
    /// Plain JSON, e.g. a mutation summary or type description
    Json(Value),
    /// One stored record
    Record { type_name: String, record: Record },
    /// A page of records with the total count before paging
    Connection {
        type_name: String,
        count: usize,
        records: Vec<Record>,
    },
}

impl CallOutput {
    pub fn into_json(self) -> Value {
        match self {
            CallOutput::Json(value) => value,
            CallOutput::Record { record, .. } => record.to_value(),
            CallOutput::Connection { count, records, .. } => json!({
                "count": count,
                "nodes": records.iter().map(Record::to_value).collect::<Vec<_>>(),
            }),
        }
    }
}

pub type ProcessFn = fn(&Schema, &Parameters) -> DbResult<CallParams>;
pub type CallFn = fn(&CallContext, CallParams) -> DbResult<CallOutput>;

/// A named root call with its two phases
pub struct RootCall {
    pub name: &'static str,
    /// Every parameter the call accepts
    pub parameters: &'static [&'static str],
    process: ProcessFn,
    call: CallFn,
}

impl std::fmt::Debug for RootCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootCall")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .finish()
    }
}

impl RootCall {
    pub const fn new(
        name: &'static str,
        parameters: &'static [&'static str],
        process: ProcessFn,
        call: CallFn,
    ) -> Self {
        Self {
            name,
            parameters,
            process,
            call,
        }
    }

    /// Decode and check `raw` against the catalog
    pub fn process_parameters(&self, schema: &Schema, raw: &Parameters) -> DbResult<CallParams> {
        if let Some(unknown) = raw.keys().find(|key| !self.parameters.contains(&key.as_str())) {
            return Err(DbError::invalid_parameter(
                unknown,
                format!("root call \"{}\" does not take this parameter", self.name),
            ));
        }

        tracing::debug!(call = self.name, ?raw, "Processing parameters");
        (self.process)(schema, raw)
    }

    pub fn call(&self, ctx: &CallContext, params: CallParams) -> DbResult<CallOutput> {
        tracing::debug!(call = self.name, "Calling root call");
        (self.call)(ctx, params)
    }
}

/// Error for a call handed parameters produced by another call
pub(crate) fn mismatched(call: &str, params: &CallParams) -> DbError {
    DbError::InternalError(format!(
        "root call \"{}\" received parameters {:?}",
        call, params
    ))
}

static REGISTRY: Lazy<HashMap<&'static str, RootCall>> = Lazy::new(|| {
    read_calls::CALLS
        .into_iter()
        .chain(schema_calls::CALLS)
        .chain(data_calls::CALLS)
        .map(|call| (call.name, call))
        .collect()
});

/// Look up a root call by name
pub fn get(name: &str) -> DbResult<&'static RootCall> {
    REGISTRY
        .get(name)
        .ok_or_else(|| DbError::UnknownRootCall(name.to_string()))
}

/// Names of all root calls, sorted
pub fn names() -> Vec<&'static str> {
    let mut names: Vec<_> = REGISTRY.keys().copied().collect();
    names.sort_unstable();
    names
}

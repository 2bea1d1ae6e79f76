//! Query executor
//!
//! Runs one query end to end: parse, look up the root call, process its
//! parameters, call it, then resolve the child selection against the result.

mod resolve;

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::config::EngineConfig;
use crate::error::DbResult;
use crate::query::{self, AstNode};
use crate::root_calls::{self, CallContext};
use crate::schema::SchemaCatalog;
use crate::storage::{MemoryStore, RecordStore};

pub use resolve::resolve_output;

/// Query executor over a catalog and a record store
#[derive(Clone)]
pub struct QueryExecutor {
    ctx: CallContext,
}

impl QueryExecutor {
    pub fn new(catalog: SchemaCatalog, store: Arc<dyn RecordStore>) -> Self {
        Self {
            ctx: CallContext::new(catalog, store),
        }
    }

    /// Create executor using the page sizes from `config`
    pub fn with_config(
        catalog: SchemaCatalog,
        store: Arc<dyn RecordStore>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            ctx: CallContext::new(catalog, store).with_limits(config.page_limits()),
        }
    }

    /// Executor over a fresh catalog and an empty in-memory store
    pub fn in_memory() -> Self {
        Self::new(SchemaCatalog::new(), Arc::new(MemoryStore::new()))
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        &self.ctx.catalog
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.ctx.store
    }

    /// Parse and run a query.
    ///
    /// The result is an object with a single key, the root call's alias or
    /// name, holding the resolved selection.
    pub fn execute(&self, input: &str) -> DbResult<Value> {
        let result = query::parse(input).and_then(|ast| self.execute_ast(&ast));
        if let Err(e) = &result {
            tracing::warn!(error = %e, kind = e.kind(), "Query rejected");
        }
        result
    }

    pub fn execute_ast(&self, ast: &AstNode) -> DbResult<Value> {
        let root_call = root_calls::get(&ast.name)?;

        // The read lock is held for processing only.
        let params = {
            let schema = self.ctx.catalog.read();
            root_call.process_parameters(&schema, &ast.parameters)?
        };

        let output = root_call.call(&self.ctx, params)?;
        let value = resolve_output(&self.ctx, output, &ast.children)?;

        let mut result = Map::new();
        result.insert(ast.output_name().to_string(), value);
        Ok(Value::Object(result))
    }
}

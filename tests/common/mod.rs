//! Common test utilities
//!
//! Provides shared helpers for:
//! - Building the User/Micropost fixture schema
//! - Running root calls through both phases
//! - Executing queries against an in-memory engine

#![allow(dead_code)]

use std::sync::Arc;

use nodeql::query::parameters;
use nodeql::root_calls::{self, CallContext, CallOutput};
use nodeql::{DbResult, FieldDef, FieldKind, MemoryStore, QueryExecutor, Schema, SchemaCatalog};

/// `User {handle}` and `Micropost {text, createdAt, author}`, with
/// `Micropost.author` connected to `User.microposts`.
pub fn test_schema() -> Schema {
    let mut schema = Schema::new();

    schema.create_type("User").unwrap();
    schema
        .create_field("User", FieldDef::new("handle", FieldKind::String).required(true))
        .unwrap();

    schema.create_type("Micropost").unwrap();
    schema
        .create_field("Micropost", FieldDef::new("text", FieldKind::String).required(true))
        .unwrap();
    schema
        .create_field(
            "Micropost",
            FieldDef::new("createdAt", FieldKind::Datetime).required(true),
        )
        .unwrap();
    schema
        .create_connection("Micropost", "author", "User", "microposts", true)
        .unwrap();

    schema
}

pub fn test_context() -> CallContext {
    CallContext::new(
        SchemaCatalog::from_schema(test_schema()),
        Arc::new(MemoryStore::new()),
    )
}

pub fn test_executor() -> QueryExecutor {
    QueryExecutor::new(
        SchemaCatalog::from_schema(test_schema()),
        Arc::new(MemoryStore::new()),
    )
}

/// Run both phases of a root call, the way a query would
pub fn process_and_call(
    ctx: &CallContext,
    call: &str,
    params: &[(&str, &str)],
) -> DbResult<CallOutput> {
    let root_call = root_calls::get(call)?;
    let raw = parameters(params.iter().copied());
    let processed = {
        let schema = ctx.catalog.read();
        root_call.process_parameters(&schema, &raw)?
    };
    root_call.call(ctx, processed)
}

/// Message of the error a call fails with
pub fn call_error(ctx: &CallContext, call: &str, params: &[(&str, &str)]) -> String {
    match process_and_call(ctx, call, params) {
        Ok(output) => panic!("{} unexpectedly succeeded: {:?}", call, output),
        Err(e) => e.to_string(),
    }
}

pub fn assert_error_contains(message: &str, expected: &str) {
    assert!(
        message.contains(expected),
        "expected error containing {:?}, got {:?}",
        expected,
        message
    );
}

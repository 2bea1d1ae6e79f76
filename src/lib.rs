pub mod config;
pub mod error;
pub mod executor;
pub mod query;
pub mod root_calls;
pub mod schema;
pub mod storage;

pub use config::{EngineConfig, PageLimits};
pub use error::{DbError, DbResult};
pub use executor::QueryExecutor;
pub use query::{parse, AstNode, NodeKind, Parameters};
pub use root_calls::{CallContext, CallOutput, CallParams, RootCall};
pub use schema::{FieldDef, FieldKind, FieldValue, Schema, SchemaCatalog, TypeDef};
pub use storage::{Filters, MemoryStore, Record, RecordStore};

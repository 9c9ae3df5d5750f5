//! Core types for the recordstore project.
//!
//! This crate holds everything that does not perform I/O: the schema
//! capability and a rule-based implementation of it, the `Record` and
//! `StoredRecord` attribute containers, table naming, the `KeyValueStore`
//! contract consumed by the persistence operations, and the `Repository`
//! that layers those operations over any store.

pub mod naming;
pub mod record;
pub mod schema;
pub mod storage;

pub use naming::TableNaming;
pub use record::{
    DefinitionError, KeySchema, QueryOptions, Record, RecordDefinition, RecordError, Repository,
    StoredRecord,
};
pub use schema::{AttributeKind, AttributeRule, RuleSchema, Schema, ValidationError};
pub use storage::{Attributes, KeyValueStore, StoreError};

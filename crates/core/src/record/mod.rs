//! Records and their persistence.
//!
//! - [`Record`] holds schema-declared attribute values and validates them.
//! - [`RecordDefinition`] names a record type, its schema, and its table layout.
//! - [`StoredRecord`] is a `Record` bound to a definition.
//! - [`Repository`] reads and writes stored records through a
//!   [`KeyValueStore`](crate::storage::KeyValueStore).

mod base;
mod definition;
mod error;
mod repository;
mod stored;

pub use base::Record;
pub use definition::{KeySchema, RecordDefinition, RecordDefinitionBuilder};
pub use error::{DefinitionError, RecordError, Result};
pub use repository::{is_truthy, PutOptions, QueryOptions, Repository};
pub use stored::StoredRecord;

//! In-memory store backend for testing.
//!
//! This module provides an in-memory implementation of the `KeyValueStore`
//! trait that keeps every table in a `HashMap` wrapped in `Arc<RwLock<_>>`.
//! It understands the same key-condition expressions, continuation tokens
//! and put conditions the repository uses against DynamoDB, which makes it
//! useful for tests and local development.
//!
//! # Example
//!
//! ```rust,ignore
//! use recordstore::storage::inmemory::InMemoryStore;
//!
//! let store = InMemoryStore::new().with_page_size(25);
//! store.create_table("MyProject-dev-Widget", "id", None).await;
//! // Hand `Arc::new(store)` to a Repository...
//! ```

mod expression;
mod store;

pub use expression::{parse_key_condition, parse_put_condition, Condition, KeyTerm, PutCondition};
pub use store::{InMemoryStore, StoreCall};

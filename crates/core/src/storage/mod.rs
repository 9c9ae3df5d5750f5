//! The key-value store contract.
//!
//! Persistence operations never talk to a concrete database. They build the
//! request types defined here and hand them to a [`KeyValueStore`]. Each trait
//! method is exactly one remote call; paging and aggregation belong to the
//! caller.

mod error;
mod traits;
mod types;

pub use error::{Result, StoreError};
pub use traits::KeyValueStore;
pub use types::{
    Attributes, BatchGetInput, GetItemInput, Item, PutAck, PutItemInput, QueryInput, QueryPage,
};

use async_trait::async_trait;

use super::{BatchGetInput, GetItemInput, Item, PutAck, PutItemInput, QueryInput, QueryPage, Result};

/// A remote key-value document store.
///
/// Implementations issue exactly one request per call and return the
/// payload without any store-specific envelope.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Point lookup by primary key. `None` when no item matches.
    async fn get_item(&self, input: GetItemInput) -> Result<Option<Item>>;

    /// Looks up several items by primary key in one request.
    ///
    /// Items come back in store order, which need not match the key order.
    /// A size- or throughput-limited response may hold fewer items than
    /// requested.
    async fn batch_get_items(&self, input: BatchGetInput) -> Result<Vec<Item>>;

    /// Runs one page of a key-condition query.
    async fn query(&self, input: QueryInput) -> Result<QueryPage>;

    /// Writes a full item, replacing any item with the same primary key.
    async fn put_item(&self, input: PutItemInput) -> Result<PutAck>;
}

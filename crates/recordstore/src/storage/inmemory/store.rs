//! In-memory store implementation.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use recordstore_core::storage::{
    Attributes, BatchGetInput, GetItemInput, Item, KeyValueStore, PutAck, PutItemInput,
    QueryInput, QueryPage, Result, StoreError,
};

use super::expression::{
    compare_values, parse_key_condition, parse_put_condition, Comparator, Condition, KeyTerm,
};

/// Maximum number of keys in one batch lookup.
const MAX_BATCH_KEYS: usize = 100;

/// A request received by the store, kept for assertions in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    GetItem { table: String },
    BatchGetItem { table: String, keys: usize },
    Query { table: String, index: Option<String> },
    PutItem { table: String },
}

/// Partition and optional sort key of a table or index.
#[derive(Debug, Clone)]
struct KeyLayout {
    partition_key: String,
    sort_key: Option<String>,
}

impl KeyLayout {
    fn new(partition_key: &str, sort_key: Option<&str>) -> Self {
        Self {
            partition_key: partition_key.to_string(),
            sort_key: sort_key.map(str::to_string),
        }
    }

    fn names(&self) -> impl Iterator<Item = &String> {
        std::iter::once(&self.partition_key).chain(self.sort_key.as_ref())
    }

    /// Extracts the key attributes, `None` when any is missing.
    fn key_of(&self, item: &Item) -> Option<Attributes> {
        self.names()
            .map(|name| {
                item.get(name)
                    .filter(|value| !value.is_null())
                    .map(|value| (name.clone(), value.clone()))
            })
            .collect()
    }

    /// Compares key attributes the way the store does, so `1` and `1.0` match.
    fn same_key(&self, item: &Item, key: &Attributes) -> bool {
        self.names().all(|name| match (item.get(name), key.get(name)) {
            (Some(a), Some(b)) => compare_values(a, b) == Some(Ordering::Equal),
            _ => false,
        })
    }

    /// Checks that `key` holds exactly this layout's attributes.
    fn check_key(&self, key: &Attributes) -> Result<Attributes> {
        match self.key_of(key) {
            Some(extracted) if extracted.len() == key.len() => Ok(extracted),
            _ => Err(StoreError::InvalidRequest(
                "The provided key element does not match the schema".to_string(),
            )),
        }
    }
}

#[derive(Debug)]
struct Table {
    layout: KeyLayout,
    indexes: HashMap<String, KeyLayout>,
    items: Vec<Item>,
}

impl Table {
    fn position(&self, key: &Attributes) -> Option<usize> {
        self.items
            .iter()
            .position(|item| self.layout.same_key(item, key))
    }
}

/// In-memory key-value store.
///
/// Items keep insertion order, which is the order batch lookups return them
/// in. Query results are ordered by the sort key of the table or index.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<HashMap<String, Table>>>,
    calls: Arc<RwLock<Vec<StoreCall>>>,
    page_size: Option<usize>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps every query page at `page_size` items.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size.max(1));
        self
    }

    /// Creates a table, replacing any table with the same name.
    pub async fn create_table(&self, name: &str, partition_key: &str, sort_key: Option<&str>) {
        let mut tables = self.tables.write().await;
        tables.insert(
            name.to_string(),
            Table {
                layout: KeyLayout::new(partition_key, sort_key),
                indexes: HashMap::new(),
                items: Vec::new(),
            },
        );
    }

    /// Adds a secondary index to an existing table.
    pub async fn create_index(
        &self,
        table: &str,
        index: &str,
        partition_key: &str,
        sort_key: Option<&str>,
    ) -> Result<()> {
        let mut tables = self.tables.write().await;
        let table = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        table
            .indexes
            .insert(index.to_string(), KeyLayout::new(partition_key, sort_key));
        Ok(())
    }

    /// Every request received so far, oldest first.
    pub async fn calls(&self) -> Vec<StoreCall> {
        self.calls.read().await.clone()
    }

    /// Number of items stored in a table.
    pub async fn item_count(&self, table: &str) -> usize {
        let tables = self.tables.read().await;
        tables.get(table).map_or(0, |table| table.items.len())
    }

    async fn record(&self, call: StoreCall) {
        self.calls.write().await.push(call);
    }
}

fn table_not_found(name: &str) -> StoreError {
    StoreError::TableNotFound(name.to_string())
}

fn compare_optional(a: Option<&serde_json::Value>, b: Option<&serde_json::Value>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => compare_values(a, b).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    }
}

/// Splits the terms into the partition equality and the optional sort condition.
fn resolve_terms(terms: Vec<KeyTerm>, layout: &KeyLayout) -> Result<(KeyTerm, Option<KeyTerm>)> {
    let missed = || {
        StoreError::InvalidRequest("Query condition missed key schema element".to_string())
    };

    let is_partition = |term: &KeyTerm| {
        term.attribute == layout.partition_key
            && matches!(term.condition, Condition::Compare(Comparator::Eq, _))
    };

    let (partition, rest): (Vec<KeyTerm>, Vec<KeyTerm>) = terms.into_iter().partition(is_partition);
    let mut partition = partition.into_iter();
    let (Some(partition), None) = (partition.next(), partition.next()) else {
        return Err(missed());
    };

    let sort = match rest.into_iter().next() {
        Some(term) if Some(&term.attribute) == layout.sort_key.as_ref() => Some(term),
        Some(_) => return Err(missed()),
        None => None,
    };

    Ok((partition, sort))
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get_item(&self, input: GetItemInput) -> Result<Option<Item>> {
        self.record(StoreCall::GetItem {
            table: input.table_name.clone(),
        })
        .await;

        let tables = self.tables.read().await;
        let table = tables
            .get(&input.table_name)
            .ok_or_else(|| table_not_found(&input.table_name))?;
        let key = table.layout.check_key(&input.key)?;

        Ok(table.position(&key).map(|index| table.items[index].clone()))
    }

    async fn batch_get_items(&self, input: BatchGetInput) -> Result<Vec<Item>> {
        self.record(StoreCall::BatchGetItem {
            table: input.table_name.clone(),
            keys: input.keys.len(),
        })
        .await;

        if input.keys.is_empty() || input.keys.len() > MAX_BATCH_KEYS {
            return Err(StoreError::InvalidRequest(format!(
                "Too many or too few items requested for the BatchGetItem call: {}",
                input.keys.len()
            )));
        }

        let tables = self.tables.read().await;
        let table = tables
            .get(&input.table_name)
            .ok_or_else(|| table_not_found(&input.table_name))?;
        let keys = input
            .keys
            .iter()
            .map(|key| table.layout.check_key(key))
            .collect::<Result<Vec<_>>>()?;

        Ok(table
            .items
            .iter()
            .filter(|item| keys.iter().any(|key| table.layout.same_key(item, key)))
            .cloned()
            .collect())
    }

    async fn query(&self, input: QueryInput) -> Result<QueryPage> {
        self.record(StoreCall::Query {
            table: input.table_name.clone(),
            index: input.index_name.clone(),
        })
        .await;

        if input.limit == Some(0) {
            return Err(StoreError::InvalidRequest(
                "Value '0' at 'limit' failed to satisfy constraint: Member must have value greater than or equal to 1"
                    .to_string(),
            ));
        }

        let tables = self.tables.read().await;
        let table = tables
            .get(&input.table_name)
            .ok_or_else(|| table_not_found(&input.table_name))?;
        let layout = match &input.index_name {
            Some(index) => table.indexes.get(index).ok_or_else(|| {
                StoreError::InvalidRequest(format!(
                    "The table does not have the specified index: {index}"
                ))
            })?,
            None => &table.layout,
        };

        let terms = parse_key_condition(
            &input.key_condition_expression,
            &input.expression_names,
            &input.expression_values,
        )?;
        let (partition, sort) = resolve_terms(terms, layout)?;

        let mut matches: Vec<&Item> = table
            .items
            .iter()
            .filter(|item| partition.matches(item))
            .filter(|item| sort.as_ref().is_none_or(|term| term.matches(item)))
            .filter(|item| layout.key_of(item).is_some())
            .collect();

        if let Some(sort_key) = &layout.sort_key {
            matches.sort_by(|a, b| compare_optional(a.get(sort_key), b.get(sort_key)));
        }
        if !input.scan_forward {
            matches.reverse();
        }

        let start = match &input.exclusive_start_key {
            Some(start_key) => {
                let start_key = table.layout.key_of(start_key).ok_or_else(|| {
                    StoreError::InvalidRequest("The provided starting key is invalid".to_string())
                })?;
                matches
                    .iter()
                    .position(|item| table.layout.same_key(item, &start_key))
                    .map(|index| index + 1)
                    .ok_or_else(|| {
                        StoreError::InvalidRequest(
                            "The provided starting key does not match any item".to_string(),
                        )
                    })?
            }
            None => 0,
        };

        let remaining = &matches[start..];
        let limit = [input.limit.map(|limit| limit as usize), self.page_size]
            .into_iter()
            .flatten()
            .min()
            .unwrap_or(remaining.len());
        let page: Vec<Item> = remaining.iter().take(limit).map(|item| (*item).clone()).collect();

        let continuation = if remaining.len() > page.len() {
            page.last().and_then(|last| {
                let mut token = table.layout.key_of(last)?;
                token.extend(layout.key_of(last)?);
                Some(token)
            })
        } else {
            None
        };

        Ok(QueryPage {
            items: page,
            continuation,
        })
    }

    async fn put_item(&self, input: PutItemInput) -> Result<PutAck> {
        self.record(StoreCall::PutItem {
            table: input.table_name.clone(),
        })
        .await;

        let mut tables = self.tables.write().await;
        let table = tables
            .get_mut(&input.table_name)
            .ok_or_else(|| table_not_found(&input.table_name))?;
        let key = table.layout.key_of(&input.item).ok_or_else(|| {
            StoreError::InvalidRequest(format!(
                "One or more parameter values were invalid: Missing the key {} in the item",
                table.layout.partition_key
            ))
        })?;

        let existing = table.position(&key);
        if let Some(expression) = &input.condition_expression {
            let condition = parse_put_condition(expression, &input.expression_names)?;
            if !condition.holds(existing.map(|index| &table.items[index])) {
                return Err(StoreError::ConditionalCheckFailed(
                    "The conditional request failed".to_string(),
                ));
            }
        }

        match existing {
            Some(index) => table.items[index] = input.item,
            None => table.items.push(input.item),
        }

        Ok(PutAck {
            table_name: input.table_name,
            consumed_capacity: Some(1.0),
        })
    }
}

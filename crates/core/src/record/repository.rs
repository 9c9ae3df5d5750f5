//! Persistence operations for stored records.
//!
//! The public operations (`find_by_pk`, `find_all_by_pk`, `find_all_by`,
//! `save`) are built on four thin request-shaping calls (`get_item`,
//! `batch_get_items`, `query_items`, `put_item`). Each thin call fills in the
//! table name, merges caller options, and issues exactly one store request.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::storage::{
    self, Attributes, BatchGetInput, GetItemInput, Item, KeyValueStore, PutAck, PutItemInput,
    QueryInput, QueryPage,
};

use super::{RecordDefinition, RecordError, Result, StoredRecord};

/// Options for [`Repository::find_all_by`].
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    /// Query a secondary index instead of the table.
    pub index_name: Option<String>,
    /// Substitutions for `#placeholder` tokens in the expression.
    pub expression_names: BTreeMap<String, String>,
    /// Maximum items per page. Pagination is followed regardless.
    pub page_size: Option<u32>,
    pub scan_forward: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            index_name: None,
            expression_names: BTreeMap::new(),
            page_size: None,
            scan_forward: true,
        }
    }
}

impl QueryOptions {
    pub fn index(mut self, name: impl Into<String>) -> Self {
        self.index_name = Some(name.into());
        self
    }

    pub fn expression_name(mut self, placeholder: impl Into<String>, name: impl Into<String>) -> Self {
        self.expression_names.insert(placeholder.into(), name.into());
        self
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn descending(mut self) -> Self {
        self.scan_forward = false;
        self
    }
}

/// Options for [`Repository::save_with`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PutOptions {
    pub condition_expression: Option<String>,
    pub expression_names: BTreeMap<String, String>,
    pub expression_values: Attributes,
}

impl PutOptions {
    pub fn condition(expression: impl Into<String>) -> Self {
        Self {
            condition_expression: Some(expression.into()),
            ..Self::default()
        }
    }
}

/// JavaScript-style truthiness used to skip blank partition keys.
///
/// `null`, `false`, `0`, `NaN` and `""` are falsy; everything else is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Reads and writes records of one type through a key-value store.
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn KeyValueStore>,
    definition: Arc<RecordDefinition>,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("definition", &self.definition)
            .finish_non_exhaustive()
    }
}

impl Repository {
    pub fn new(store: Arc<dyn KeyValueStore>, definition: Arc<RecordDefinition>) -> Self {
        Self { store, definition }
    }

    pub fn definition(&self) -> &Arc<RecordDefinition> {
        &self.definition
    }

    pub fn table_name(&self) -> &str {
        self.definition.table_name()
    }

    /// Creates an empty record of this repository's type.
    pub fn new_record(&self) -> StoredRecord {
        StoredRecord::new(Arc::clone(&self.definition))
    }

    fn hydrate(&self, item: Item) -> StoredRecord {
        StoredRecord::from_item(Arc::clone(&self.definition), item)
    }

    // ========================================================================
    // Public operations
    // ========================================================================

    /// Looks up a record by primary key.
    ///
    /// Returns `Ok(None)` when no item matches.
    pub async fn find_by_pk(
        &self,
        partition_value: Value,
        sort_value: Option<Value>,
    ) -> Result<Option<StoredRecord>> {
        let key = self.definition.key_for(partition_value, sort_value);
        let item = self.get_item(key).await?;
        Ok(item.map(|item| self.hydrate(item)))
    }

    /// Looks up several records in one batch request.
    ///
    /// Falsy partition values are skipped. A sort value is used when the
    /// sort list has a non-null entry at the same index. Records come back in
    /// store order. Keys the store leaves unprocessed are not re-requested.
    pub async fn find_all_by_pk(
        &self,
        partition_values: &[Value],
        sort_values: Option<&[Value]>,
    ) -> Result<Vec<StoredRecord>> {
        let keys: Vec<Attributes> = partition_values
            .iter()
            .enumerate()
            .filter(|(_, value)| is_truthy(value))
            .map(|(index, value)| {
                let sort_value = sort_values
                    .and_then(|values| values.get(index))
                    .filter(|value| !value.is_null())
                    .cloned();
                self.definition.key_for(value.clone(), sort_value)
            })
            .collect();

        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let items = self.batch_get_items(keys).await?;
        Ok(items.into_iter().map(|item| self.hydrate(item)).collect())
    }

    /// Runs a key-condition query and follows every continuation token.
    ///
    /// Items are returned in store order, page after page.
    pub async fn find_all_by(
        &self,
        key_condition_expression: &str,
        expression_values: Attributes,
        options: QueryOptions,
    ) -> Result<Vec<StoredRecord>> {
        let mut records = Vec::new();
        let mut start_key = None;
        let mut pages = 0usize;

        loop {
            let page = self
                .query_items(
                    key_condition_expression,
                    expression_values.clone(),
                    &options,
                    start_key.take(),
                )
                .await?;
            pages += 1;

            tracing::trace!(
                table = self.table_name(),
                page = pages,
                items = page.items.len(),
                more = page.continuation.is_some(),
                "Fetched query page"
            );

            records.extend(page.items.into_iter().map(|item| self.hydrate(item)));

            match page.continuation {
                Some(token) => start_key = Some(token),
                None => break,
            }
        }

        Ok(records)
    }

    /// Validates the record and writes it, replacing any existing item.
    pub async fn save(&self, record: &mut StoredRecord) -> Result<PutAck> {
        self.save_with(record, PutOptions::default()).await
    }

    /// Like [`Repository::save`], with a put condition.
    ///
    /// An invalid record fails with [`RecordError::Validation`] before any
    /// store request is made.
    pub async fn save_with(&self, record: &mut StoredRecord, options: PutOptions) -> Result<PutAck> {
        record.check().map_err(RecordError::Validation)?;

        let item = record.attributes();
        let keys = self.definition.key_schema();
        for name in std::iter::once(&keys.partition_key_name).chain(keys.sort_key_name.as_ref()) {
            if item.get(name).is_none_or(Value::is_null) {
                return Err(RecordError::MissingKey(name.clone()));
            }
        }

        let ack = self.put_item(record.table_name(), item, options).await?;
        Ok(ack)
    }

    // ========================================================================
    // Thin store calls
    // ========================================================================

    /// One point lookup against this repository's table.
    pub async fn get_item(&self, key: Attributes) -> storage::Result<Option<Item>> {
        tracing::debug!(table = self.table_name(), "GetItem");
        self.store
            .get_item(GetItemInput {
                table_name: self.table_name().to_string(),
                key,
                consistent_read: false,
            })
            .await
    }

    /// One batch lookup against this repository's table.
    pub async fn batch_get_items(&self, keys: Vec<Attributes>) -> storage::Result<Vec<Item>> {
        tracing::debug!(table = self.table_name(), keys = keys.len(), "BatchGetItem");
        self.store
            .batch_get_items(BatchGetInput {
                table_name: self.table_name().to_string(),
                keys,
                consistent_read: false,
            })
            .await
    }

    /// One query page against this repository's table or one of its indexes.
    pub async fn query_items(
        &self,
        key_condition_expression: &str,
        expression_values: Attributes,
        options: &QueryOptions,
        exclusive_start_key: Option<Attributes>,
    ) -> storage::Result<QueryPage> {
        tracing::debug!(
            table = self.table_name(),
            index = options.index_name.as_deref(),
            continued = exclusive_start_key.is_some(),
            "Query"
        );
        self.store
            .query(QueryInput {
                table_name: self.table_name().to_string(),
                index_name: options.index_name.clone(),
                key_condition_expression: key_condition_expression.to_string(),
                expression_values,
                expression_names: options.expression_names.clone(),
                limit: options.page_size,
                scan_forward: options.scan_forward,
                exclusive_start_key,
            })
            .await
    }

    /// One full-item write.
    pub async fn put_item(
        &self,
        table_name: &str,
        item: Item,
        options: PutOptions,
    ) -> storage::Result<PutAck> {
        tracing::debug!(table = table_name, "PutItem");
        self.store
            .put_item(PutItemInput {
                table_name: table_name.to_string(),
                item,
                condition_expression: options.condition_expression,
                expression_names: options.expression_names,
                expression_values: options.expression_values,
            })
            .await
    }
}

//! DynamoDB store implementation.
//!
//! Implements `KeyValueStore` from `recordstore_core::storage` using DynamoDB.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, KeysAndAttributes, ReturnConsumedCapacity};
use aws_sdk_dynamodb::Client;

use recordstore_core::storage::{
    Attributes, BatchGetInput, GetItemInput, Item, KeyValueStore, PutAck, PutItemInput,
    QueryInput, QueryPage, Result, StoreError,
};

use super::client::create_client;
use super::conversions::{attributes_to_item, item_to_attributes};
use super::error::{map_batch_get_item_error, map_get_item_error, map_put_item_error, map_query_error};
use crate::config::Config;

/// DynamoDB-backed key-value store.
///
/// Wraps one long-lived SDK client shared by every repository.
#[derive(Debug, Clone)]
pub struct DynamoDbStore {
    client: Client,
}

impl DynamoDbStore {
    /// Creates a store with the given DynamoDB client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Creates a store from process configuration.
    ///
    /// Uses the AWS SDK default credential chain.
    pub async fn from_config(config: &Config) -> Self {
        Self::new(create_client(config).await)
    }

    /// Creates a store from environment configuration.
    pub async fn from_env() -> Self {
        Self::from_config(&Config::from_env()).await
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// DynamoDB rejects empty expression maps, so empty maps are omitted.
fn optional_values(values: &Attributes) -> Option<HashMap<String, AttributeValue>> {
    (!values.is_empty()).then(|| item_to_attributes(values))
}

fn optional_names(names: &BTreeMap<String, String>) -> Option<HashMap<String, String>> {
    (!names.is_empty()).then(|| names.clone().into_iter().collect())
}

#[async_trait]
impl KeyValueStore for DynamoDbStore {
    async fn get_item(&self, input: GetItemInput) -> Result<Option<Item>> {
        let result = self
            .client
            .get_item()
            .table_name(&input.table_name)
            .set_key(Some(item_to_attributes(&input.key)))
            .consistent_read(input.consistent_read)
            .send()
            .await
            .map_err(|e| map_get_item_error(e, &input.table_name))?;

        result.item.as_ref().map(attributes_to_item).transpose()
    }

    async fn batch_get_items(&self, input: BatchGetInput) -> Result<Vec<Item>> {
        let keys = input.keys.iter().map(item_to_attributes).collect();
        let request = KeysAndAttributes::builder()
            .set_keys(Some(keys))
            .consistent_read(input.consistent_read)
            .build()
            .map_err(|e| StoreError::InvalidRequest(e.to_string()))?;

        let result = self
            .client
            .batch_get_item()
            .request_items(&input.table_name, request)
            .send()
            .await
            .map_err(|e| map_batch_get_item_error(e, &input.table_name))?;

        // Unprocessed keys are reported, not re-requested.
        if let Some(unprocessed) = result
            .unprocessed_keys
            .as_ref()
            .and_then(|tables| tables.get(&input.table_name))
        {
            tracing::warn!(
                table = %input.table_name,
                requested = input.keys.len(),
                unprocessed = unprocessed.keys().len(),
                "BatchGetItem left keys unprocessed"
            );
        }

        let mut responses = result.responses.unwrap_or_default();
        responses
            .remove(&input.table_name)
            .unwrap_or_default()
            .iter()
            .map(attributes_to_item)
            .collect()
    }

    async fn query(&self, input: QueryInput) -> Result<QueryPage> {
        let limit = input
            .limit
            .map(|limit| i32::try_from(limit).unwrap_or(i32::MAX));

        let result = self
            .client
            .query()
            .table_name(&input.table_name)
            .set_index_name(input.index_name.clone())
            .key_condition_expression(&input.key_condition_expression)
            .set_expression_attribute_values(optional_values(&input.expression_values))
            .set_expression_attribute_names(optional_names(&input.expression_names))
            .set_limit(limit)
            .scan_index_forward(input.scan_forward)
            .set_exclusive_start_key(input.exclusive_start_key.as_ref().map(item_to_attributes))
            .send()
            .await
            .map_err(|e| map_query_error(e, &input.table_name))?;

        let items = result
            .items
            .unwrap_or_default()
            .iter()
            .map(attributes_to_item)
            .collect::<Result<Vec<_>>>()?;
        let continuation = result
            .last_evaluated_key
            .as_ref()
            .map(attributes_to_item)
            .transpose()?;

        Ok(QueryPage {
            items,
            continuation,
        })
    }

    async fn put_item(&self, input: PutItemInput) -> Result<PutAck> {
        let result = self
            .client
            .put_item()
            .table_name(&input.table_name)
            .set_item(Some(item_to_attributes(&input.item)))
            .set_condition_expression(input.condition_expression.clone())
            .set_expression_attribute_names(optional_names(&input.expression_names))
            .set_expression_attribute_values(optional_values(&input.expression_values))
            .return_consumed_capacity(ReturnConsumedCapacity::Total)
            .send()
            .await
            .map_err(|e| map_put_item_error(e, &input.table_name))?;

        Ok(PutAck {
            table_name: input.table_name,
            consumed_capacity: result
                .consumed_capacity
                .and_then(|capacity| capacity.capacity_units),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_expression_maps_are_omitted() {
        assert!(optional_values(&Attributes::new()).is_none());
        assert!(optional_names(&BTreeMap::new()).is_none());
    }

    #[test]
    fn test_expression_maps_are_converted() {
        let mut values = Attributes::new();
        values.insert(":id".to_string(), json!("w-1"));
        let converted = optional_values(&values).unwrap();
        assert_eq!(converted.get(":id"), Some(&AttributeValue::S("w-1".to_string())));

        let names = BTreeMap::from([("#n".to_string(), "name".to_string())]);
        let converted = optional_names(&names).unwrap();
        assert_eq!(converted.get("#n").map(String::as_str), Some("name"));
    }
}

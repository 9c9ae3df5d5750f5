use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An ordered attribute-name to value mapping.
///
/// Absence of a key means "not set"; a `Value::Null` entry is an explicit null.
pub type Attributes = Map<String, Value>;

/// A stored document.
pub type Item = Attributes;

/// Point lookup request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GetItemInput {
    pub table_name: String,
    pub key: Attributes,
    pub consistent_read: bool,
}

/// Batch lookup request for a single table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchGetInput {
    pub table_name: String,
    pub keys: Vec<Attributes>,
    pub consistent_read: bool,
}

/// One page of a key-condition query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryInput {
    pub table_name: String,
    pub index_name: Option<String>,
    pub key_condition_expression: String,
    /// Substitutions for `:placeholder` tokens.
    pub expression_values: Attributes,
    /// Substitutions for `#placeholder` tokens.
    pub expression_names: BTreeMap<String, String>,
    pub limit: Option<u32>,
    pub scan_forward: bool,
    /// Continuation token from the previous page.
    pub exclusive_start_key: Option<Attributes>,
}

impl Default for QueryInput {
    fn default() -> Self {
        Self {
            table_name: String::new(),
            index_name: None,
            key_condition_expression: String::new(),
            expression_values: Attributes::new(),
            expression_names: BTreeMap::new(),
            limit: None,
            scan_forward: true,
            exclusive_start_key: None,
        }
    }
}

/// Items of one query page plus the token to fetch the next one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryPage {
    pub items: Vec<Item>,
    /// Present when more results remain.
    pub continuation: Option<Attributes>,
}

/// Full-item write request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PutItemInput {
    pub table_name: String,
    pub item: Item,
    pub condition_expression: Option<String>,
    pub expression_names: BTreeMap<String, String>,
    pub expression_values: Attributes,
}

/// Write acknowledgment returned by the store.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PutAck {
    pub table_name: String,
    /// Capacity units consumed, when the store reports them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumed_capacity: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_input_defaults_to_forward_scan() {
        let input = QueryInput::default();
        assert!(input.scan_forward);
        assert!(input.exclusive_start_key.is_none());
        assert!(input.index_name.is_none());
    }

    #[test]
    fn test_put_ack_omits_missing_capacity() {
        let ack = PutAck {
            table_name: "Widget".to_string(),
            consumed_capacity: None,
        };
        assert_eq!(
            serde_json::to_value(&ack).unwrap(),
            serde_json::json!({"table_name": "Widget"})
        );
    }
}

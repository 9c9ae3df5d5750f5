//! DynamoDB store backend.
//!
//! This module provides a DynamoDB-based implementation of the
//! `KeyValueStore` trait using `aws-sdk-dynamodb`.

mod client;
mod conversions;
mod error;
mod store;

pub use client::create_client;
pub use conversions::{attribute_to_value, attributes_to_item, item_to_attributes, value_to_attribute};
pub use store::DynamoDbStore;

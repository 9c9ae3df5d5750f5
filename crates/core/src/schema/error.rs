use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// The first validation failure reported by a schema.
///
/// Carries the offending attribute name, every rule violation found for that
/// attribute, and the supplied value (`None` when the attribute was absent).
#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
#[error("{name}: {} (got {})", .errors.join("; "), describe_value(.value))]
pub struct ValidationError {
    pub name: String,
    pub errors: Vec<String>,
    pub value: Option<Value>,
}

impl ValidationError {
    pub fn new(name: impl Into<String>, errors: Vec<String>, value: Option<Value>) -> Self {
        Self {
            name: name.into(),
            errors,
            value,
        }
    }
}

fn describe_value(value: &Option<Value>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "nothing".to_string(),
    }
}

/// Errors that can occur when building a schema.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Schema name cannot be empty")]
    EmptyName,
    #[error("Attribute name cannot be empty")]
    EmptyAttributeName,
    #[error("Attribute declared twice: {0}")]
    DuplicateAttribute(String),
}

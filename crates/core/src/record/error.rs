use thiserror::Error;

use crate::schema::ValidationError;
use crate::storage::StoreError;

/// Errors that can occur when building a record definition.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("Record type name cannot be empty")]
    EmptyTypeName,
    #[error("Table name cannot be empty for {0}")]
    EmptyTableName(String),
    #[error("No partition key declared for {0}")]
    MissingPartitionKey(String),
    #[error("Key attribute {attribute} is not declared by the {type_name} schema")]
    UndeclaredKey { type_name: String, attribute: String },
}

/// Errors returned by record persistence operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RecordError {
    #[error("Validation failed: {0}")]
    Validation(ValidationError),
    #[error("Record has no value for key attribute {0}")]
    MissingKey(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for record persistence operations.
pub type Result<T> = std::result::Result<T, RecordError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_undeclared_key_display() {
        let error = DefinitionError::UndeclaredKey {
            type_name: "Widget".to_string(),
            attribute: "sku".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Key attribute sku is not declared by the Widget schema"
        );
    }

    #[test]
    fn test_validation_display_carries_first_failure() {
        let error = RecordError::Validation(ValidationError::new(
            "price",
            vec!["must be a number".to_string()],
            Some(json!("free")),
        ));
        assert_eq!(
            error.to_string(),
            "Validation failed: price: must be a number (got \"free\")"
        );
    }

    #[test]
    fn test_store_error_is_transparent() {
        let error: RecordError = StoreError::AccessDenied("no put permission".to_string()).into();
        assert_eq!(error.to_string(), "Access denied: no put permission");
    }
}

use thiserror::Error;

/// Errors reported by a key-value store.
///
/// Backends map their native failures onto these variants and callers
/// receive them unchanged. No variant is retried by this crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Table not found: {0}")]
    TableNotFound(String),
    #[error("Throughput exceeded: {0}")]
    ThroughputExceeded(String),
    #[error("Access denied: {0}")]
    AccessDenied(String),
    #[error("Conditional check failed: {0}")]
    ConditionalCheckFailed(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Connection failed: {0}")]
    Connection(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Store service error: {0}")]
    Service(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

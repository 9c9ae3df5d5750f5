//! Store backend implementations.
//!
//! This module provides concrete implementations of the
//! [`KeyValueStore`](recordstore_core::KeyValueStore) trait. Backends are
//! selected at compile time via feature flags.
//!
//! # Feature Flags
//!
//! - `dynamodb` (default): AWS DynamoDB backend using `aws-sdk-dynamodb`
//! - `inmemory` (default): in-process backend for tests and local development
//!
//! Both backends can be compiled in together; callers pick one when
//! constructing a `Repository`.

#[cfg(not(any(feature = "dynamodb", feature = "inmemory")))]
compile_error!(
    "No store backend selected. Enable 'dynamodb' or 'inmemory' feature. \
    Example: cargo build -p recordstore --features inmemory"
);

#[cfg(feature = "dynamodb")]
pub mod dynamodb;

#[cfg(feature = "inmemory")]
pub mod inmemory;

#[cfg(feature = "dynamodb")]
pub use dynamodb::DynamoDbStore;

#[cfg(feature = "inmemory")]
pub use inmemory::InMemoryStore;

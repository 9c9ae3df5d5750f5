//! Active-record style object mapping over key-value document stores.
//!
//! Record types, schemas and the persistence operations live in
//! [`recordstore_core`]. This crate adds the concrete store backends and the
//! environment configuration used to wire them up.

pub mod config;
pub mod storage;

pub use config::Config;
pub use recordstore_core as core;

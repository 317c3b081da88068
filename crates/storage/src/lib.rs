//! Storage abstraction and implementations for Cadence.
//!
//! This crate provides the query/update service interface the core
//! components run against, an in-memory implementation and a JSON file
//! implementation.

#![warn(missing_docs)]

pub mod trait_;
pub mod memory_storage;
pub mod json_storage;

pub use trait_::{Storage, StorageError, Result};
pub use memory_storage::MemoryStorage;
pub use json_storage::JsonStorage;

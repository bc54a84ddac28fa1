//! Storage is a tiny string key-value port, the same shape as browser local storage.
//!  - Values are strings. Callers decide how to encode them (waterminder uses JSON).
//!  - [file_store::FileKeyValueStore] keeps every key in a single JSON document on disk.
//!  - [memory_store::MemoryKeyValueStore] keeps them in memory and forgets on drop.

pub mod file_store;
pub mod memory_store;

use std::{future::Future, ops::Deref};

use anyhow::Result;

/// Interface for abstracting the persisted key-value state.
pub trait KeyValueStore {
    /// Returns `None` when the key was never written.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>>;

    fn set(&self, key: &str, value: String) -> impl Future<Output = Result<()>>;
}

impl<T: Deref> KeyValueStore for T
where
    T::Target: KeyValueStore,
{
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> {
        self.deref().get(key)
    }

    fn set(&self, key: &str, value: String) -> impl Future<Output = Result<()>> {
        self.deref().set(key, value)
    }
}

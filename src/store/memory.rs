//! In-memory store backed by a hash map

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{BoxError, Store};

/// Store that keeps values in process memory
#[derive(Debug)]
pub struct MemoryStore<T> {
    entries: RwLock<HashMap<String, T>>,
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<T: Clone> MemoryStore<T> {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with one entry
    pub fn with_entry(key: impl Into<String>, value: T) -> Self {
        let store = Self::new();
        store.insert(key, value);
        store
    }

    /// Inserts or replaces the value under `key`
    pub fn insert(&self, key: impl Into<String>, value: T) {
        self.entries.write().insert(key.into(), value);
    }

    /// Returns a copy of the value under `key`, if any
    pub fn peek(&self, key: &str) -> Option<T> {
        self.entries.read().get(key).cloned()
    }

    /// Removes the value under `key`, returning whether one was present
    pub fn delete(&self, key: &str) -> bool {
        self.entries.write().remove(key).is_some()
    }

    /// Returns all keys currently stored, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Removes every entry
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

#[async_trait]
impl<T> Store<T> for MemoryStore<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<Option<T>, BoxError> {
        Ok(self.peek(key))
    }

    async fn set(&self, key: &str, value: &T) -> Result<(), BoxError> {
        self.insert(key, value.clone());
        Ok(())
    }
}

//! Backing stores for cached values
//!
//! A store is the fast, possibly stale source a cache consults before going to
//! the remote fetcher. Three implementations are provided: [`NullStore`] for
//! caches without persistence, [`MemoryStore`] for tests and embedding, and
//! [`FileStore`] which keeps one JSON file per key on disk.

mod file;
mod memory;

pub use file::{CachedData, FileStore, FileStoreError};
pub use memory::MemoryStore;

use std::sync::Arc;

use async_trait::async_trait;

/// Error type returned by store and fetcher capabilities
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Keyed asynchronous storage for a cached value
///
/// `get` returns `Ok(None)` when nothing is stored under the key. Any value
/// that is present counts as a hit, including values such as `0`, `false` or
/// an empty string.
#[async_trait]
pub trait Store<T>: Send + Sync {
    /// Reads the value stored under `key`
    async fn get(&self, key: &str) -> Result<Option<T>, BoxError>;

    /// Stores `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &T) -> Result<(), BoxError>;
}

#[async_trait]
impl<T, S> Store<T> for Arc<S>
where
    S: Store<T> + ?Sized,
    T: Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<Option<T>, BoxError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &T) -> Result<(), BoxError> {
        (**self).set(key, value).await
    }
}

/// Store that keeps nothing
///
/// Every read is a miss and every write succeeds without effect. Used when a
/// cache has no backing storage.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStore;

#[async_trait]
impl<T: Send + Sync + 'static> Store<T> for NullStore {
    async fn get(&self, _key: &str) -> Result<Option<T>, BoxError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &T) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Returns true if `key` can be used as a store key
///
/// Keys must be non-empty and contain only ASCII letters, digits, `-`, `_`
/// and `.`, and may not be `.` or `..`. This keeps keys usable as file names.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key != "."
        && key != ".."
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

use std::sync::Arc;

use thiserror::Error;

use crate::store::BoxError;

/// Capability error shared between every caller that observes it
pub type SharedError = Arc<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by cache operations
///
/// Each variant wraps the failing capability's error unchanged. The error is
/// `Clone` so a failed initialization can be reported to every waiter.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// Reading the backing store failed during initialization
    #[error("Failed to read '{key}' from store: {source}")]
    StoreRead { key: String, source: SharedError },

    /// Writing the fetched value to the backing store failed
    #[error("Failed to write '{key}' to store: {source}")]
    StoreWrite { key: String, source: SharedError },

    /// The fetcher failed to produce a value
    #[error("Failed to fetch value for '{key}': {source}")]
    Fetch { key: String, source: SharedError },
}

impl CacheError {
    pub(crate) fn store_read(key: &str, source: BoxError) -> Self {
        Self::StoreRead {
            key: key.to_string(),
            source: Arc::from(source),
        }
    }

    pub(crate) fn store_write(key: &str, source: BoxError) -> Self {
        Self::StoreWrite {
            key: key.to_string(),
            source: Arc::from(source),
        }
    }

    pub(crate) fn fetch(key: &str, source: BoxError) -> Self {
        Self::Fetch {
            key: key.to_string(),
            source: Arc::from(source),
        }
    }

    /// The cache key the failed operation addressed
    pub fn key(&self) -> &str {
        match self {
            Self::StoreRead { key, .. } | Self::StoreWrite { key, .. } | Self::Fetch { key, .. } => key,
        }
    }

    /// The underlying capability error
    pub fn inner(&self) -> &SharedError {
        match self {
            Self::StoreRead { source, .. }
            | Self::StoreWrite { source, .. }
            | Self::Fetch { source, .. } => source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_messages_include_key_and_cause() {
        let err = CacheError::fetch("settings", "connection reset".into());

        assert_eq!(err.key(), "settings");
        assert_eq!(
            err.to_string(),
            "Failed to fetch value for 'settings': connection reset"
        );
    }

    #[test]
    fn test_source_is_the_capability_error() {
        let err = CacheError::store_write("k", "disk full".into());

        let source = err.source().expect("Should expose a source");
        assert_eq!(source.to_string(), "disk full");
        assert_eq!(err.inner().to_string(), "disk full");
    }

    #[test]
    fn test_clones_share_the_same_cause() {
        let err = CacheError::store_read("k", "corrupt".into());
        let clone = err.clone();

        assert!(Arc::ptr_eq(err.inner(), clone.inner()));
        assert!(matches!(clone, CacheError::StoreRead { .. }));
    }
}

use std::fmt;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::{Mutex, RwLock};

use super::error::CacheError;
use crate::fetch::Fetcher;
use crate::store::{NullStore, Store};

/// Memoized first initialization, shared by every caller of `ready`
type InitTask = Shared<BoxFuture<'static, Result<(), CacheError>>>;

/// Lifecycle of a cache's first initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// `ready` has never been called
    Uninitialized,
    /// The first initialization is in flight
    Initializing,
    /// Initialization completed; `refresh` keeps it here
    Ready,
    /// Initialization failed; the cache stays failed
    Failed,
}

/// State reachable from the initialization task
///
/// Kept apart from the task slot so the task never holds a reference back to
/// itself.
struct Core<T> {
    key: String,
    fetcher: Box<dyn Fetcher<T>>,
    store: Box<dyn Store<T>>,
    value: RwLock<Option<T>>,
}

impl<T> Core<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Loads from the store, falling back to the fetcher on a miss
    async fn initialize(&self) -> Result<(), CacheError> {
        let stored = self
            .store
            .get(&self.key)
            .await
            .map_err(|e| CacheError::store_read(&self.key, e))?;

        match stored {
            Some(value) => {
                *self.value.write() = Some(value);
                Ok(())
            }
            None => self.refresh().await,
        }
    }

    /// Fetches, writes through to the store, then updates the in-memory copy
    ///
    /// The in-memory copy is updated even when the store write fails; the
    /// write error is still returned.
    async fn refresh(&self) -> Result<(), CacheError> {
        let fresh = self
            .fetcher
            .fetch()
            .await
            .map_err(|e| CacheError::fetch(&self.key, e))?;

        let written = self.store.set(&self.key, &fresh).await;
        *self.value.write() = Some(fresh);

        written.map_err(|e| CacheError::store_write(&self.key, e))
    }
}

/// Cache for one value backed by a store and a fetcher
///
/// Cloning the cache is cheap; clones share the value and the initialization.
/// Concurrent `refresh` calls are not ordered against each other or against
/// an in-flight initialization: the write that completes last wins.
pub struct SingleValueCache<T> {
    core: Arc<Core<T>>,
    init: Arc<Mutex<Option<InitTask>>>,
}

impl<T> Clone for SingleValueCache<T> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
            init: Arc::clone(&self.init),
        }
    }
}

impl<T> fmt::Debug for SingleValueCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleValueCache")
            .field("key", &self.core.key)
            .field("initialized", &self.init.lock().is_some())
            .finish_non_exhaustive()
    }
}

impl<T> SingleValueCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates a cache for `key` backed by `store`, populated by `fetcher`
    pub fn new(
        key: impl Into<String>,
        fetcher: impl Fetcher<T> + 'static,
        store: impl Store<T> + 'static,
    ) -> Self {
        Self {
            core: Arc::new(Core {
                key: key.into(),
                fetcher: Box::new(fetcher),
                store: Box::new(store),
                value: RwLock::new(None),
            }),
            init: Arc::new(Mutex::new(None)),
        }
    }

    /// Creates a cache with no backing store
    ///
    /// Initialization always misses and goes to the fetcher.
    pub fn without_store(key: impl Into<String>, fetcher: impl Fetcher<T> + 'static) -> Self {
        Self::new(key, fetcher, NullStore)
    }

    pub fn key(&self) -> &str {
        &self.core.key
    }

    /// Returns the in-memory value without waiting
    ///
    /// `None` until initialization or a refresh has produced a value.
    pub fn value(&self) -> Option<T> {
        self.core.value.read().clone()
    }

    pub fn state(&self) -> CacheState {
        match self.init.lock().as_ref() {
            None => CacheState::Uninitialized,
            Some(task) => match task.peek() {
                None => CacheState::Initializing,
                Some(Ok(())) => CacheState::Ready,
                Some(Err(_)) => CacheState::Failed,
            },
        }
    }

    /// Waits for the first initialization to complete
    ///
    /// The first call starts initialization; later and concurrent calls wait
    /// on the same task and see the same result. A failed initialization is
    /// never retried by this instance.
    pub async fn ready(&self) -> Result<(), CacheError> {
        let task = self.init_task();
        task.await
    }

    /// Fetches a fresh value and writes it through to the store
    ///
    /// On a fetch error the in-memory value is left unchanged. On a store write
    /// error the in-memory value is still updated and the error returned.
    pub async fn refresh(&self) -> Result<(), CacheError> {
        self.core.refresh().await
    }

    fn init_task(&self) -> InitTask {
        let mut slot = self.init.lock();
        slot.get_or_insert_with(|| {
            let core = Arc::clone(&self.core);
            async move { core.initialize().await }.boxed().shared()
        })
        .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{BoxError, MemoryStore};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_fetcher(
        value: &'static str,
    ) -> (
        Arc<AtomicUsize>,
        impl Fn() -> BoxFuture<'static, Result<String, BoxError>> + Send + Sync + 'static,
    ) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let fetcher = move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { Ok::<_, BoxError>(value.to_string()) }.boxed()
        };
        (calls, fetcher)
    }

    #[tokio::test]
    async fn test_state_moves_from_uninitialized_to_ready() {
        let (_, fetcher) = counting_fetcher("v1");
        let cache: SingleValueCache<String> = SingleValueCache::without_store("k", fetcher);

        assert_eq!(cache.state(), CacheState::Uninitialized);
        assert!(cache.value().is_none());

        cache.ready().await.expect("Initialization should succeed");

        assert_eq!(cache.state(), CacheState::Ready);
        assert_eq!(cache.value().as_deref(), Some("v1"));
    }

    #[tokio::test]
    async fn test_state_is_failed_after_fetch_error() {
        let fetcher = || async { Err::<String, BoxError>("offline".into()) };
        let cache: SingleValueCache<String> = SingleValueCache::without_store("k", fetcher);

        let err = cache.ready().await.unwrap_err();

        assert!(matches!(err, CacheError::Fetch { .. }));
        assert_eq!(cache.state(), CacheState::Failed);
        assert!(cache.value().is_none());
    }

    #[tokio::test]
    async fn test_refresh_does_not_start_initialization() {
        let (calls, fetcher) = counting_fetcher("fresh");
        let cache: SingleValueCache<String> = SingleValueCache::without_store("k", fetcher);

        cache.refresh().await.unwrap();

        assert_eq!(cache.state(), CacheState::Uninitialized);
        assert_eq!(cache.value().as_deref(), Some("fresh"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_clones_share_value_and_initialization() {
        let (calls, fetcher) = counting_fetcher("shared");
        let store = MemoryStore::new();
        let cache: SingleValueCache<String> = SingleValueCache::new("k", fetcher, store);
        let clone = cache.clone();

        cache.ready().await.unwrap();
        clone.ready().await.unwrap();

        assert_eq!(clone.value().as_deref(), Some("shared"));
        assert_eq!(clone.state(), CacheState::Ready);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_debug_output_names_key() {
        let (_, fetcher) = counting_fetcher("v");
        let cache: SingleValueCache<String> = SingleValueCache::without_store("settings", fetcher);

        let debug = format!("{:?}", cache);

        assert!(debug.contains("settings"));
        assert_eq!(cache.key(), "settings");
    }
}

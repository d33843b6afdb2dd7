//! Background refresh of a cached value
//!
//! Periodically calls [`SingleValueCache::refresh`] in a background task and
//! reports each outcome over a tokio channel.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::cache::{CacheError, SingleValueCache};

/// Messages sent from the background refresh task
#[derive(Debug, Clone)]
pub enum RefreshMessage<T> {
    /// A refresh cycle started
    RefreshStarted,
    /// The cache holds a newly fetched value
    Refreshed(T),
    /// The refresh failed
    ///
    /// When only the store write failed, the cache already holds the new value
    /// and a `Refreshed` message for it is sent just before this one.
    RefreshError(String),
}

/// Configuration for background refresh
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Time between refreshes
    pub interval: Duration,
    /// Whether the background task runs at all
    pub enabled: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300), // 5 minutes
            enabled: true,
        }
    }
}

/// Handle for controlling the background refresh task
pub struct RefreshHandle<T> {
    /// Channel for receiving refresh messages
    pub receiver: mpsc::Receiver<RefreshMessage<T>>,
    /// Requests an out-of-schedule refresh
    trigger_tx: mpsc::Sender<()>,
    /// Signals shutdown
    shutdown_tx: mpsc::Sender<()>,
}

impl<T> RefreshHandle<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates a RefreshHandle and spawns the background refresh task
    ///
    /// Must be called from within a tokio runtime. With `enabled = false`
    /// nothing is spawned and no messages are ever received.
    pub fn spawn(cache: SingleValueCache<T>, config: RefreshConfig) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel(32);
        let (trigger_tx, mut trigger_rx) = mpsc::channel::<()>(1);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        if config.enabled {
            // tokio::time::interval panics on a zero period
            let period = config.interval.max(Duration::from_millis(1));

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(period);
                // Skip the first tick (immediate)
                interval.tick().await;

                loop {
                    tokio::select! {
                        _ = interval.tick() => {}
                        Some(()) = trigger_rx.recv() => {}
                        _ = shutdown_rx.recv() => break,
                    }

                    if !run_cycle(&cache, &msg_tx).await {
                        break;
                    }
                }
                debug!(key = cache.key(), "background refresh stopped");
            });
        }

        Self {
            receiver: msg_rx,
            trigger_tx,
            shutdown_tx,
        }
    }

    /// Requests an immediate refresh
    ///
    /// Requests made while one is already pending are coalesced.
    pub fn request_refresh(&self) {
        let _ = self.trigger_tx.try_send(());
    }

    /// Shuts down the background refresh task
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

/// Runs one refresh and reports it; returns false once nobody is listening
async fn run_cycle<T>(cache: &SingleValueCache<T>, tx: &mpsc::Sender<RefreshMessage<T>>) -> bool
where
    T: Clone + Send + Sync + 'static,
{
    if tx.send(RefreshMessage::RefreshStarted).await.is_err() {
        return false;
    }

    let outcome = cache.refresh().await;

    let value_updated = matches!(outcome, Ok(()) | Err(CacheError::StoreWrite { .. }));
    if value_updated {
        if let Some(value) = cache.value() {
            if tx.send(RefreshMessage::Refreshed(value)).await.is_err() {
                return false;
            }
        }
    }

    match outcome {
        Ok(()) => true,
        Err(e) => {
            warn!(key = cache.key(), error = %e, "background refresh failed");
            tx.send(RefreshMessage::RefreshError(e.to_string())).await.is_ok()
        }
    }
}

/// Checks for pending refresh messages without blocking
///
/// # Returns
/// * `Some(RefreshMessage)` if a message was available
/// * `None` if no messages are pending
pub fn try_recv<T>(handle: &mut RefreshHandle<T>) -> Option<RefreshMessage<T>> {
    handle.receiver.try_recv().ok()
}

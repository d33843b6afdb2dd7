//! Authoritative value sources
//!
//! A fetcher produces the current value from wherever it really lives, usually
//! a remote server. Any async closure returning `Result<T, BoxError>` is a
//! fetcher; [`HttpFetcher`] covers the common case of a JSON document served
//! over HTTP.

pub mod http;

pub use http::{HttpFetchError, HttpFetcher};

use std::future::Future;

use async_trait::async_trait;

use crate::store::BoxError;

/// Zero-argument asynchronous source of the authoritative value
///
/// Any parameters (URL, credentials, query) belong to the fetcher itself.
#[async_trait]
pub trait Fetcher<T>: Send + Sync {
    async fn fetch(&self) -> Result<T, BoxError>;
}

#[async_trait]
impl<T, F, Fut> Fetcher<T> for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, BoxError>> + Send + 'static,
    T: Send + 'static,
{
    async fn fetch(&self) -> Result<T, BoxError> {
        (self)().await
    }
}

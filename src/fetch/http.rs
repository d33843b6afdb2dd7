//! HTTP JSON fetcher
//!
//! Fetches a JSON document from a fixed URL and decodes it into the cached
//! value type.

use std::marker::PhantomData;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use super::Fetcher;
use crate::store::BoxError;

/// Errors that can occur when fetching a document
#[derive(Debug, Error)]
pub enum HttpFetchError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Server returned HTTP {status} for {url}")]
    Status { status: u16, url: Url },

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Client that fetches and decodes the document at one URL
#[derive(Debug, Clone)]
pub struct HttpFetcher<T> {
    client: Client,
    url: Url,
    _value: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> HttpFetcher<T> {
    /// Create a new HttpFetcher with a default HTTP client
    pub fn new(url: Url) -> Self {
        Self::with_client(Client::new(), url)
    }

    /// Create a new HttpFetcher with a custom HTTP client
    pub fn with_client(client: Client, url: Url) -> Self {
        Self {
            client,
            url,
            _value: PhantomData,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Fetch and decode the document
    ///
    /// # Returns
    /// * `Ok(T)` - The decoded document
    /// * `Err(HttpFetchError)` - If the request fails, the status is not 2xx, or parsing fails
    pub async fn fetch_value(&self) -> Result<T, HttpFetchError> {
        debug!(url = %self.url, "fetching document");
        let response = self.client.get(self.url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(HttpFetchError::Status {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }

        let text = response.text().await?;
        parse_body(&text)
    }
}

/// Decode a response body into the value type
fn parse_body<T: DeserializeOwned>(text: &str) -> Result<T, HttpFetchError> {
    Ok(serde_json::from_str(text)?)
}

#[async_trait]
impl<T> Fetcher<T> for HttpFetcher<T>
where
    T: DeserializeOwned + Send + 'static,
{
    async fn fetch(&self) -> Result<T, BoxError> {
        Ok(self.fetch_value().await?)
    }
}

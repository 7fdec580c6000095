//! HTTP client abstraction for document retrieval
//!
//! Catalog and manifest fetches go through the [`CatalogHttpClient`] trait so
//! the fetch logic can be exercised against in-memory documents in tests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::errors::{AppResult, CatalogError};

/// Async JSON document fetcher
#[async_trait]
pub trait CatalogHttpClient: Send + Sync {
    /// Fetch a URL and decode the response body as JSON
    async fn fetch_json(&self, url: &str) -> AppResult<Value>;
}

/// Default implementation of [`CatalogHttpClient`] using reqwest
pub struct StandardHttpClient {
    client: Client,
}

impl StandardHttpClient {
    pub fn new() -> Self {
        Self::with_connect_timeout(Duration::from_secs(10))
    }

    /// Connection timeout only; document bodies may stream for longer
    pub fn with_connect_timeout(connect_timeout: Duration) -> Self {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }
}

impl Default for StandardHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogHttpClient for StandardHttpClient {
    async fn fetch_json(&self, url: &str) -> AppResult<Value> {
        debug!("Fetching JSON document from: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CatalogError::fetch(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        let document = response
            .json::<Value>()
            .await
            .map_err(|e| CatalogError::malformed(url, e.to_string()))?;

        debug!("Fetched JSON document from: {}", url);
        Ok(document)
    }
}

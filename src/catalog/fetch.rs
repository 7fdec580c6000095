//! Catalog document retrieval with manifest indirection and fallback
//!
//! A deployment may publish a small manifest document whose job is to point
//! at the current catalog URL (so catalogs can be rotated without shipping a
//! client update). Loading therefore walks an ordered candidate chain:
//!
//! 1. the URL named by the manifest (first present field from
//!    [`MANIFEST_URL_FIELDS`](super::MANIFEST_URL_FIELDS)), when a manifest
//!    URL is configured and the manifest itself is fetchable;
//! 2. the statically configured fallback catalog URL.
//!
//! Individual candidate failures are recovered by moving down the chain and
//! only logged; [`CatalogError::Unavailable`] is returned solely when every
//! candidate has failed, which is the one state the UI surfaces to the user
//! (with a manual retry affordance).

use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use super::{MANIFEST_URL_FIELDS, first_present};
use crate::config::CatalogConfig;
use crate::errors::{CatalogError, CatalogResult};
use crate::utils::http_client::CatalogHttpClient;

pub struct CatalogFetcher<C> {
    http: C,
    config: CatalogConfig,
}

impl<C: CatalogHttpClient> CatalogFetcher<C> {
    pub fn new(http: C, config: CatalogConfig) -> Self {
        Self { http, config }
    }

    /// Load the catalog document, following manifest indirection and the
    /// fallback chain. A repeated call simply repeats the whole sequence;
    /// the caller replaces its state with whatever loads last.
    pub async fn load(&self) -> CatalogResult<Value> {
        let mut candidates: Vec<String> = Vec::new();

        if let Some(manifest_url) = &self.config.manifest_url {
            match self.resolve_manifest(manifest_url).await {
                Ok(Some(catalog_url)) => candidates.push(catalog_url),
                Ok(None) => debug!("Manifest at {} names no catalog URL", manifest_url),
                Err(e) => warn!("Manifest fetch failed, using fallback chain: {}", e),
            }
        }
        if !candidates.contains(&self.config.fallback_url) {
            candidates.push(self.config.fallback_url.clone());
        }

        for candidate in &candidates {
            if Url::parse(candidate).is_err() {
                warn!("Skipping invalid catalog URL: {}", candidate);
                continue;
            }
            match self.http.fetch_json(candidate).await {
                Ok(document) => {
                    info!("Loaded catalog from {}", candidate);
                    return Ok(document);
                }
                Err(e) => warn!("Catalog fetch failed for {}: {}", candidate, e),
            }
        }

        Err(CatalogError::Unavailable)
    }

    async fn resolve_manifest(&self, manifest_url: &str) -> CatalogResult<Option<String>> {
        let manifest = self
            .http
            .fetch_json(manifest_url)
            .await
            .map_err(|e| CatalogError::fetch(manifest_url, e.to_string()))?;

        Ok(first_present(&manifest, MANIFEST_URL_FIELDS)
            .and_then(Value::as_str)
            .map(str::to_string))
    }
}

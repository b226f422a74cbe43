// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
DANDI archive catalog client.

Listing endpoints return `{"results": [...], "next": <url or null>}`; the
`next` URL is used verbatim as the continuation cursor.
*/

use std::time::Duration;

use async_trait::async_trait;
use brain_atlas_config::{CatalogConfig, RetryConfig};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::retry::RetryPolicy;
use crate::traits::CatalogService;
use crate::types::*;

#[derive(Debug, Deserialize)]
struct ListingResponse<T> {
    results: Vec<T>,
    #[serde(default)]
    next: Option<String>,
}

/// HTTP client for the DANDI REST API
#[derive(Debug, Clone)]
pub struct DandiCatalogClient {
    http: reqwest::Client,
    api_url: String,
    version: String,
    dataset_page_size: usize,
    asset_page_size: usize,
    asset_glob: String,
    asset_suffix: String,
    retry: RetryPolicy,
}

impl DandiCatalogClient {
    /// Create a client with its own connection pool
    pub fn new(config: &CatalogConfig, retry: &RetryConfig) -> ServiceResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ServiceError::Transport(format!("http client build failed: {}", e)))?;
        Ok(Self::with_client(http, config, retry))
    }

    /// Create a client on a shared `reqwest::Client`
    pub fn with_client(http: reqwest::Client, config: &CatalogConfig, retry: &RetryConfig) -> Self {
        Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            version: config.version.clone(),
            dataset_page_size: config.dataset_page_size,
            asset_page_size: config.asset_page_size,
            asset_glob: config.asset_glob.clone(),
            asset_suffix: config.asset_suffix.clone(),
            retry: RetryPolicy::from(retry),
        }
    }

    /// Override the retry policy (tests use a zero backoff)
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn version_url(&self, dataset_id: &str) -> String {
        format!("{}/dandisets/{}/versions/{}", self.api_url, dataset_id, self.version)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> ServiceResult<T> {
        let http = &self.http;
        self.retry
            .run(url, move || async move {
                let response = http
                    .get(url)
                    .query(query)
                    .send()
                    .await
                    .map_err(|e| ServiceError::from_reqwest(e, url))?;

                let status = response.status();
                if !status.is_success() {
                    return Err(ServiceError::Http {
                        status: status.as_u16(),
                        url: url.to_string(),
                    });
                }

                response
                    .json::<T>()
                    .await
                    .map_err(|e| ServiceError::InvalidResponse(format!("{}: {}", url, e)))
            })
            .await
    }
}

#[async_trait]
impl CatalogService for DandiCatalogClient {
    async fn dataset_page(&self, cursor: Option<&PageCursor>) -> ServiceResult<Page<DatasetSummary>> {
        let listing: ListingResponse<DatasetSummary> = match cursor {
            Some(next) => self.get_json(next, &[]).await?,
            None => {
                let url = format!("{}/dandisets/", self.api_url);
                let query = [
                    ("page_size", self.dataset_page_size.to_string()),
                    ("ordering", "-modified".to_string()),
                ];
                self.get_json(&url, &query).await?
            }
        };

        Ok(Page {
            items: listing.results,
            next: listing.next,
        })
    }

    async fn asset_page(
        &self,
        dataset_id: &str,
        cursor: Option<&PageCursor>,
    ) -> ServiceResult<Page<AssetSummary>> {
        let listing: ListingResponse<AssetSummary> = match cursor {
            Some(next) => self.get_json(next, &[]).await?,
            None => {
                let url = format!("{}/assets/", self.version_url(dataset_id));
                let query = [
                    ("page_size", self.asset_page_size.to_string()),
                    ("glob", self.asset_glob.clone()),
                ];
                self.get_json(&url, &query).await?
            }
        };

        let total = listing.results.len();
        let items: Vec<AssetSummary> = listing
            .results
            .into_iter()
            .filter(|asset| asset.path.ends_with(&self.asset_suffix))
            .collect();
        if items.len() != total {
            debug!(
                target: "brain-atlas-services",
                "Dataset {}: dropped {} assets without suffix {}",
                dataset_id,
                total - items.len(),
                self.asset_suffix
            );
        }

        Ok(Page {
            items,
            next: listing.next,
        })
    }

    async fn dataset_metadata(&self, dataset_id: &str) -> ServiceResult<serde_json::Value> {
        let url = format!("{}/", self.version_url(dataset_id));
        self.get_json(&url, &[]).await
    }

    fn asset_locator(&self, dataset_id: &str, asset_id: &str) -> String {
        format!("{}/assets/{}/download/", self.version_url(dataset_id), asset_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_format() {
        let config = CatalogConfig {
            api_url: "https://api.example.org/api/".to_string(),
            ..CatalogConfig::default()
        };
        let client = DandiCatalogClient::new(&config, &RetryConfig::default()).unwrap();
        assert_eq!(
            client.asset_locator("000409", "abc-123"),
            "https://api.example.org/api/dandisets/000409/versions/draft/assets/abc-123/download/"
        );
    }
}

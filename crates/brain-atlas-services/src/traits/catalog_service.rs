/*!
Catalog service trait.

Copyright 2025 Neuraville Inc.
Licensed under the Apache License, Version 2.0
*/

use crate::types::*;
use async_trait::async_trait;

/// Remote archive catalog
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Fetch one page of the dataset listing, most recently modified first
    ///
    /// # Arguments
    /// * `cursor` - Continuation token from the previous page, `None` for the first
    ///
    /// # Errors
    /// * `ServiceError::Http` - Non-success response after retries
    /// * `ServiceError::InvalidResponse` - Unexpected payload
    ///
    async fn dataset_page(&self, cursor: Option<&PageCursor>) -> ServiceResult<Page<DatasetSummary>>;

    /// Fetch one page of a dataset's recording assets
    ///
    /// # Arguments
    /// * `dataset_id` - Dataset identifier (e.g. "000409")
    /// * `cursor` - Continuation token from the previous page
    ///
    async fn asset_page(
        &self,
        dataset_id: &str,
        cursor: Option<&PageCursor>,
    ) -> ServiceResult<Page<AssetSummary>>;

    /// Fetch the metadata document of a dataset's working version
    ///
    /// Used for the species check.
    ///
    async fn dataset_metadata(&self, dataset_id: &str) -> ServiceResult<serde_json::Value>;

    /// Downloadable locator of an asset (no network call)
    fn asset_locator(&self, dataset_id: &str, asset_id: &str) -> String;
}

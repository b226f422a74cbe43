// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Cursor-following helpers over a [`CatalogService`].

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use crate::traits::CatalogService;
use crate::types::*;

/// Every dataset in the catalog, most recently modified first
pub async fn collect_all_datasets(catalog: &dyn CatalogService) -> ServiceResult<Vec<DatasetSummary>> {
    let mut datasets = Vec::new();
    let mut cursor: Option<PageCursor> = None;
    loop {
        let page = catalog.dataset_page(cursor.as_ref()).await?;
        datasets.extend(page.items);
        match page.next {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }
    debug!(target: "brain-atlas-services", "Catalog lists {} datasets", datasets.len());
    Ok(datasets)
}

/// Datasets modified strictly after `since`
///
/// Relies on the recency ordering of the listing: paging stops at the
/// first entry that is not newer than `since`.
pub async fn datasets_modified_since(
    catalog: &dyn CatalogService,
    since: DateTime<Utc>,
) -> ServiceResult<Vec<DatasetSummary>> {
    let mut datasets = Vec::new();
    let mut cursor: Option<PageCursor> = None;
    loop {
        let page = catalog.dataset_page(cursor.as_ref()).await?;
        for dataset in page.items {
            if dataset.modified <= since {
                return Ok(datasets);
            }
            datasets.push(dataset);
        }
        match page.next {
            Some(next) => cursor = Some(next),
            None => return Ok(datasets),
        }
    }
}

/// Every recording asset of a dataset
pub async fn collect_assets(
    catalog: &dyn CatalogService,
    dataset_id: &str,
) -> ServiceResult<Vec<AssetSummary>> {
    let mut assets = Vec::new();
    let mut cursor: Option<PageCursor> = None;
    loop {
        let page = catalog.asset_page(dataset_id, cursor.as_ref()).await?;
        assets.extend(page.items);
        match page.next {
            Some(next) => cursor = Some(next),
            None => return Ok(assets),
        }
    }
}

/// True if the dataset's metadata lists a species whose identifier
/// contains `taxon` (e.g. "10090" matches "NCBITaxon_10090")
pub async fn dataset_has_species(
    catalog: &dyn CatalogService,
    dataset_id: &str,
    taxon: &str,
) -> ServiceResult<bool> {
    let metadata = catalog.dataset_metadata(dataset_id).await?;
    Ok(metadata_has_species(&metadata, taxon))
}

/// Species check on a metadata document
///
/// The document may be the bare metadata or wrapped under `metadata`.
pub fn metadata_has_species(metadata: &Value, taxon: &str) -> bool {
    let document = metadata.get("metadata").unwrap_or(metadata);
    document
        .get("assetsSummary")
        .and_then(|summary| summary.get("species"))
        .and_then(Value::as_array)
        .map(|species| {
            species.iter().any(|entry| {
                entry
                    .get("identifier")
                    .and_then(Value::as_str)
                    .is_some_and(|identifier| identifier.contains(taxon))
            })
        })
        .unwrap_or(false)
}

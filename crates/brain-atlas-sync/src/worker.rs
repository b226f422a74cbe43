// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Per-asset processing: fetch, match, record.

use std::collections::BTreeMap;
use std::sync::Arc;

use brain_atlas_cache::{CacheKey, CacheService, ElectrodeEntry, LabelEntry, LabelStatus};
use brain_atlas_services::{
    filter_anatomical_coordinates, AssetSummary, CatalogService, ContentExtractor, LocationSet,
};
use brain_atlas_structures::{is_placeholder, LocationMatcher, RegionRef};
use tracing::{debug, info, warn};

use crate::error::SyncResult;

/// Processes single assets against the shared cache
///
/// Shared by the probe phase and every pool task of a run.
pub struct AssetWorker {
    catalog: Arc<dyn CatalogService>,
    extractor: Arc<dyn ContentExtractor>,
    matcher: LocationMatcher,
    cache: Arc<CacheService>,
}

impl AssetWorker {
    pub fn new(
        catalog: Arc<dyn CatalogService>,
        extractor: Arc<dyn ContentExtractor>,
        matcher: LocationMatcher,
        cache: Arc<CacheService>,
    ) -> Self {
        Self {
            catalog,
            extractor,
            matcher,
            cache,
        }
    }

    pub fn cache(&self) -> &CacheService {
        &self.cache
    }

    /// Process one asset unless the cache already holds it
    ///
    /// Returns the label status, cached or fresh. Extraction failures are
    /// recorded as an `error` entry; only a failed cache append is an `Err`.
    pub async fn process(&self, dataset_id: &str, asset: &AssetSummary) -> SyncResult<LabelStatus> {
        let key = CacheKey::new(dataset_id, &asset.asset_id);
        if let Some(status) = self.cache.check_and_skip(&key) {
            debug!(target: "brain-atlas-sync", "{}: cached ({})", asset.path, status);
            return Ok(status);
        }

        let locator = self.catalog.asset_locator(dataset_id, &asset.asset_id);

        let label = match self.extractor.extract_locations(&locator).await {
            Ok(locations) => self.label_entry(dataset_id, asset, &locations),
            Err(e) => LabelEntry::failed(dataset_id, &asset.asset_id, &asset.path, e.to_string()),
        };

        let coords = match self.extractor.extract_coordinates(&locator).await {
            Ok(rows) => filter_anatomical_coordinates(&rows),
            Err(e) => {
                warn!(target: "brain-atlas-sync", "Electrode error {}/{}: {}", dataset_id, asset.path, e);
                None
            }
        };
        let electrode = ElectrodeEntry {
            dataset_id: dataset_id.to_string(),
            asset_id: asset.asset_id.clone(),
            path: asset.path.clone(),
            coords,
        };

        let status = label.status;
        let regions = label.matched_locations.len();
        let error = label.error.clone();
        let has_electrodes = electrode.has_coords();

        self.cache.record(label, electrode)?;

        match status {
            LabelStatus::Error => warn!(
                target: "brain-atlas-sync",
                "ERROR {}/{}: {}",
                dataset_id,
                asset.path,
                error.as_deref().unwrap_or("unknown")
            ),
            _ => info!(
                target: "brain-atlas-sync",
                "{}: {}, {} regions{}",
                asset.path,
                status,
                regions,
                if has_electrodes { ", has electrodes" } else { "" }
            ),
        }
        Ok(status)
    }

    /// Match every distinct location string, in sorted order
    fn label_entry(&self, dataset_id: &str, asset: &AssetSummary, locations: &LocationSet) -> LabelEntry {
        let mut unique = locations.unique();
        unique.sort_unstable();

        let mut matched_locations = BTreeMap::new();
        let mut unmatched_locations = Vec::new();
        for location in unique {
            let nodes = self.matcher.match_location(location);
            if nodes.is_empty() {
                if !is_placeholder(location) {
                    unmatched_locations.push(location.to_string());
                }
                continue;
            }
            let regions: Vec<RegionRef> = nodes.into_iter().map(RegionRef::from).collect();
            matched_locations.insert(location.to_string(), regions);
        }

        let status = if locations.is_empty() {
            LabelStatus::NoLocations
        } else if matched_locations.is_empty() {
            LabelStatus::NoMatch
        } else {
            LabelStatus::Matched
        };

        LabelEntry {
            dataset_id: dataset_id.to_string(),
            asset_id: asset.asset_id.clone(),
            path: asset.path.clone(),
            status,
            matched_locations,
            unmatched_locations,
            error: None,
        }
    }
}

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Cache record types.
//!
//! Field names follow the on-disk log format, which is shared with the
//! downstream viewer tooling.

use std::collections::BTreeMap;

use brain_atlas_structures::RegionRef;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Index key of a cache record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    pub dataset_id: String,
    pub asset_id: String,
}

impl CacheKey {
    pub fn new(dataset_id: impl Into<String>, asset_id: impl Into<String>) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            asset_id: asset_id.into(),
        }
    }
}

/// A record that can live in an [`crate::AssetCache`]
pub trait CacheRecord: Serialize + DeserializeOwned + Clone + Send {
    fn dataset_id(&self) -> &str;
    fn asset_id(&self) -> &str;

    fn key(&self) -> CacheKey {
        CacheKey::new(self.dataset_id(), self.asset_id())
    }
}

/// Outcome of location matching for one asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelStatus {
    /// The asset carries no location strings
    NoLocations,
    /// At least one location matched a structure
    Matched,
    /// Locations exist but none matched
    NoMatch,
    /// Reading the asset failed
    Error,
}

impl std::fmt::Display for LabelStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            LabelStatus::NoLocations => "no_locations",
            LabelStatus::Matched => "matched",
            LabelStatus::NoMatch => "no_match",
            LabelStatus::Error => "error",
        };
        f.write_str(label)
    }
}

/// Location matching result of one asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEntry {
    #[serde(rename = "dandiset_id")]
    pub dataset_id: String,
    pub asset_id: String,
    pub path: String,
    pub status: LabelStatus,
    /// Raw location string to the structures it matched
    #[serde(default)]
    pub matched_locations: BTreeMap<String, Vec<RegionRef>>,
    /// Non-placeholder location strings that matched nothing
    #[serde(default)]
    pub unmatched_locations: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl LabelEntry {
    /// Entry for an asset that could not be read
    pub fn failed(
        dataset_id: impl Into<String>,
        asset_id: impl Into<String>,
        path: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            asset_id: asset_id.into(),
            path: path.into(),
            status: LabelStatus::Error,
            matched_locations: BTreeMap::new(),
            unmatched_locations: Vec::new(),
            error: Some(error.into()),
        }
    }

    /// Matched regions in location order; an id may repeat across locations
    pub fn regions(&self) -> impl Iterator<Item = &RegionRef> {
        self.matched_locations.values().flatten()
    }
}

impl CacheRecord for LabelEntry {
    fn dataset_id(&self) -> &str {
        &self.dataset_id
    }

    fn asset_id(&self) -> &str {
        &self.asset_id
    }
}

/// Electrode coordinates of one asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectrodeEntry {
    #[serde(rename = "dandiset_id")]
    pub dataset_id: String,
    pub asset_id: String,
    pub path: String,
    /// Absent when the asset has no usable atlas coordinates
    #[serde(default)]
    pub coords: Option<Vec<[f64; 3]>>,
}

impl ElectrodeEntry {
    pub fn has_coords(&self) -> bool {
        self.coords.as_ref().is_some_and(|c| !c.is_empty())
    }
}

impl CacheRecord for ElectrodeEntry {
    fn dataset_id(&self) -> &str {
        &self.dataset_id
    }

    fn asset_id(&self) -> &str {
        &self.asset_id
    }
}

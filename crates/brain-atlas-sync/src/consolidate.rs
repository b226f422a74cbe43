// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Consolidation of cache contents into the published listings.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use brain_atlas_cache::{ElectrodeEntry, LabelEntry};
use brain_atlas_services::Coordinate;
use brain_atlas_structures::{AssetEntry, AssetListing, StructureId};
use tracing::debug;

/// Electrode coordinates per dataset, then per asset id
pub type ElectrodeListing = BTreeMap<String, BTreeMap<String, Vec<Coordinate>>>;

/// Asset listing from label entries
///
/// Every entry is listed, whatever its status. Regions keep the location
/// order of the entry, with hidden structures and repeats removed. Assets
/// are ordered by subject, then path.
pub fn build_asset_listing(labels: &[LabelEntry], hidden: &HashSet<StructureId>) -> AssetListing {
    let mut listing = AssetListing::new();
    for label in labels {
        let entry = AssetEntry::new(
            label.path.clone(),
            label.asset_id.clone(),
            label.regions().cloned(),
            hidden,
        );
        listing.entry(label.dataset_id.clone()).or_default().push(entry);
    }

    for assets in listing.values_mut() {
        assets.sort_by(|a, b| (a.subject(), &a.path).cmp(&(b.subject(), &b.path)));
    }
    listing
}

/// Electrode listing from electrode entries
///
/// Assets without accepted coordinates are left out, and so are datasets
/// left with no assets.
pub fn build_electrode_listing(electrodes: &[ElectrodeEntry]) -> ElectrodeListing {
    let mut listing = ElectrodeListing::new();
    for entry in electrodes {
        let Some(coords) = entry.coords.as_ref().filter(|c| !c.is_empty()) else {
            continue;
        };
        listing
            .entry(entry.dataset_id.clone())
            .or_default()
            .insert(entry.asset_id.clone(), coords.clone());
    }
    listing
}

/// Keep prior outputs of datasets this run neither rebuilt nor processed
///
/// Returns the number of datasets carried forward.
pub fn carry_forward<T>(
    built: &mut BTreeMap<String, T>,
    prior: BTreeMap<String, T>,
    processed: &BTreeSet<String>,
) -> usize {
    let mut carried = 0;
    for (dataset_id, value) in prior {
        if built.contains_key(&dataset_id) || processed.contains(&dataset_id) {
            continue;
        }
        built.insert(dataset_id, value);
        carried += 1;
    }
    if carried > 0 {
        debug!(target: "brain-atlas-sync", "Carried forward {} datasets", carried);
    }
    carried
}

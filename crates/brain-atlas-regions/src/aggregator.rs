// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Region aggregation.

Direct pass: every (asset, region) association adds one to the region's
file count and the asset's dataset to the region's dataset set.

Propagation pass: every region with direct data adds its direct count and
dataset set to each of its ancestors' totals. Totals therefore satisfy
`direct(S) ⊆ total(A)` for every ancestor `A` of a data node `S`.
*/

use std::collections::{BTreeMap, BTreeSet};

use brain_atlas_structures::{AssetListing, StructureGraph, StructureId};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Color used for structures without one in the ontology
pub const DEFAULT_REGION_COLOR: &str = "AAAAAA";

/// One row of the region table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSummary {
    pub acronym: String,
    pub name: String,
    pub color_hex_triplet: String,
    /// Associations naming this structure directly
    pub file_count: usize,
    pub dandiset_count: usize,
    /// Sorted
    pub dandisets: Vec<String>,
    /// Direct count plus the direct counts of every descendant
    pub total_file_count: usize,
    pub total_dandiset_count: usize,
    /// Sorted
    pub total_dandisets: Vec<String>,
}

/// Region table keyed by structure id
pub type RegionTable = BTreeMap<StructureId, RegionSummary>;

#[derive(Default)]
struct Tally {
    datasets: BTreeSet<String>,
    files: usize,
}

/// Builds the region table over a structure graph
pub struct RegionAggregator<'a> {
    graph: &'a StructureGraph,
}

impl<'a> RegionAggregator<'a> {
    pub fn new(graph: &'a StructureGraph) -> Self {
        Self { graph }
    }

    /// Aggregate a consolidated listing
    ///
    /// Region ids unknown to the graph are ignored. The result covers every
    /// structure with direct data or with a descendant that has direct data.
    pub fn aggregate(&self, listing: &AssetListing) -> RegionTable {
        let mut direct: BTreeMap<StructureId, Tally> = BTreeMap::new();
        for (dataset_id, assets) in listing {
            for asset in assets {
                for region_id in asset.region_ids() {
                    if !self.graph.contains(region_id) {
                        continue;
                    }
                    let tally = direct.entry(region_id).or_default();
                    tally.datasets.insert(dataset_id.clone());
                    tally.files += 1;
                }
            }
        }

        let mut totals: BTreeMap<StructureId, Tally> = direct
            .iter()
            .map(|(&id, tally)| {
                (
                    id,
                    Tally {
                        datasets: tally.datasets.clone(),
                        files: tally.files,
                    },
                )
            })
            .collect();

        for (&id, tally) in &direct {
            for ancestor in self.graph.ancestors(id) {
                let total = totals.entry(ancestor).or_default();
                total.datasets.extend(tally.datasets.iter().cloned());
                total.files += tally.files;
            }
        }

        let table: RegionTable = totals
            .into_iter()
            .filter_map(|(id, total)| {
                let node = self.graph.get(id)?;
                let own = direct.get(&id);
                Some((
                    id,
                    RegionSummary {
                        acronym: node.acronym.clone(),
                        name: node.name.clone(),
                        color_hex_triplet: node
                            .color
                            .clone()
                            .unwrap_or_else(|| DEFAULT_REGION_COLOR.to_string()),
                        file_count: own.map_or(0, |t| t.files),
                        dandiset_count: own.map_or(0, |t| t.datasets.len()),
                        dandisets: own
                            .map(|t| t.datasets.iter().cloned().collect())
                            .unwrap_or_default(),
                        total_file_count: total.files,
                        total_dandiset_count: total.datasets.len(),
                        total_dandisets: total.datasets.into_iter().collect(),
                    },
                ))
            })
            .collect();

        debug!(
            target: "brain-atlas-regions",
            "Aggregated {} structures with direct data into {} rows",
            direct.len(),
            table.len()
        );
        table
    }
}

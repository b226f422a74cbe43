// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashSet;

use brain_atlas_regions::RegionAggregator;
use brain_atlas_structures::{AssetEntry, AssetListing, RegionRef, StructureGraph, StructureNode};
use proptest::prelude::*;

/// Random tree where node `i` hangs under some node with a smaller index
fn tree() -> impl Strategy<Value = StructureGraph> {
    (2usize..40).prop_flat_map(|size| {
        proptest::collection::vec(any::<prop::sample::Index>(), size - 1).prop_map(move |parents| {
            let mut nodes = vec![StructureNode {
                id: 1,
                acronym: "root".into(),
                name: "root".into(),
                color: None,
                parent_id: None,
            }];
            for (i, parent) in parents.iter().enumerate() {
                let id = i as u32 + 2;
                nodes.push(StructureNode {
                    id,
                    acronym: format!("s{}", id),
                    name: format!("structure {}", id),
                    color: None,
                    parent_id: Some(parent.index(i + 1) as u32 + 1),
                });
            }
            StructureGraph::from_nodes(nodes).unwrap()
        })
    })
}

fn listing(graph_size: usize, picks: &[(u8, Vec<prop::sample::Index>)]) -> AssetListing {
    let mut listing = AssetListing::new();
    for (n, (dataset, regions)) in picks.iter().enumerate() {
        let regions = regions.iter().map(|idx| {
            let id = idx.index(graph_size) as u32 + 1;
            RegionRef {
                id,
                acronym: format!("s{}", id),
                name: String::new(),
            }
        });
        listing
            .entry(format!("{:06}", dataset % 5))
            .or_default()
            .push(AssetEntry::new(format!("sub-{}/f.nwb", n), n.to_string(), regions, &HashSet::new()));
    }
    listing
}

proptest! {
    #[test]
    fn totals_cover_every_descendant(
        graph in tree(),
        picks in proptest::collection::vec(
            (any::<u8>(), proptest::collection::vec(any::<prop::sample::Index>(), 0..4)),
            0..30,
        ),
    ) {
        let listing = listing(graph.len(), &picks);
        let table = RegionAggregator::new(&graph).aggregate(&listing);

        for (&id, row) in &table {
            prop_assert!(row.total_file_count >= row.file_count);
            for ancestor in graph.ancestors(id) {
                let above = table.get(&ancestor);
                prop_assert!(above.is_some(), "ancestor {} of {} missing", ancestor, id);
                let above = above.unwrap();
                prop_assert!(above.total_file_count >= row.total_file_count);
                for dataset in &row.dandisets {
                    prop_assert!(above.total_dandisets.contains(dataset));
                }
            }
        }

        let associations: usize = listing.values().flatten().map(|a| a.regions.len()).sum();
        let root_total = table.get(&1).map_or(0, |row| row.total_file_count);
        prop_assert_eq!(root_total, associations);
    }
}

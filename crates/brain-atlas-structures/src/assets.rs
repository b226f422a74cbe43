// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Per-asset records of the consolidated listing, and the path labels
//! (subject, session, description) encoded in archive file paths.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::graph::{StructureId, StructureNode};

const SESSION_MARKER: &str = "_ses-";
const DESCRIPTION_MARKER: &str = "_desc-";
const PROCESSED_ONLY_SUFFIX: &str = "-processed-only";

/// Consolidated asset listing: dataset id to its assets, ordered by
/// subject then path
pub type AssetListing = BTreeMap<String, Vec<AssetEntry>>;

/// Reference to a matched structure
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionRef {
    pub id: StructureId,
    pub acronym: String,
    pub name: String,
}

impl From<&StructureNode> for RegionRef {
    fn from(node: &StructureNode) -> Self {
        Self {
            id: node.id,
            acronym: node.acronym.clone(),
            name: node.name.clone(),
        }
    }
}

/// One asset of the consolidated listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetEntry {
    pub path: String,
    pub asset_id: String,
    pub regions: Vec<RegionRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
}

impl AssetEntry {
    /// Build an entry, dropping hidden structures and repeated ids
    ///
    /// Session and description labels are derived from the path.
    pub fn new<I>(
        path: impl Into<String>,
        asset_id: impl Into<String>,
        regions: I,
        hidden: &HashSet<StructureId>,
    ) -> Self
    where
        I: IntoIterator<Item = RegionRef>,
    {
        let path = path.into();
        let mut seen = HashSet::new();
        let regions = regions
            .into_iter()
            .filter(|region| !hidden.contains(&region.id) && seen.insert(region.id))
            .collect();

        Self {
            session: session_of(&path),
            desc: description_of(&path).map(str::to_string),
            path,
            asset_id: asset_id.into(),
            regions,
        }
    }

    pub fn subject(&self) -> &str {
        subject_of(&self.path)
    }

    pub fn region_ids(&self) -> impl Iterator<Item = StructureId> + '_ {
        self.regions.iter().map(|r| r.id)
    }
}

/// Subject label of a path
///
/// The first directory component, or for a flat path the text before the
/// first `_`.
pub fn subject_of(path: &str) -> &str {
    match path.split_once('/') {
        Some((subject, _)) => subject,
        None => path.split('_').next().unwrap_or(path),
    }
}

/// Session label of a path, with any `-processed-only` suffix removed
pub fn session_of(path: &str) -> Option<String> {
    let label = label_after(path, SESSION_MARKER)?;
    Some(
        label
            .strip_suffix(PROCESSED_ONLY_SUFFIX)
            .unwrap_or(label)
            .to_string(),
    )
}

/// Description label of a path
pub fn description_of(path: &str) -> Option<&str> {
    label_after(path, DESCRIPTION_MARKER)
}

/// First non-empty run of characters after `marker` up to `_` or `/`
fn label_after<'a>(path: &'a str, marker: &str) -> Option<&'a str> {
    path.match_indices(marker).find_map(|(offset, _)| {
        let rest = &path[offset + marker.len()..];
        let end = rest.find(['_', '/']).unwrap_or(rest.len());
        (end > 0).then(|| &rest[..end])
    })
}

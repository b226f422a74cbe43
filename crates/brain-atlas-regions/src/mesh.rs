// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Mesh set planning and reconciliation
//!
//! The viewer needs geometry for every structure in the region table, for
//! all of their ancestors (to draw the nesting), and for the whole-organ
//! outline. Missing geometry is fetched; anything still missing afterwards
//! is listed in the manifest so the viewer can degrade gracefully.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use brain_atlas_services::GeometrySource;
use brain_atlas_structures::{StructureGraph, StructureId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::aggregator::RegionTable;
use crate::error::{MeshError, MeshResult};

/// Structures needing geometry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshSet {
    /// Structures with direct or aggregate data
    pub data: BTreeSet<StructureId>,
    /// Every ancestor of a data structure
    pub ancestors: BTreeSet<StructureId>,
    /// Whole-organ outline, always included
    pub outline: StructureId,
}

impl MeshSet {
    /// data ∪ ancestors ∪ {outline}
    pub fn targets(&self) -> BTreeSet<StructureId> {
        let mut targets: BTreeSet<StructureId> = self.data.union(&self.ancestors).copied().collect();
        targets.insert(self.outline);
        targets
    }

    /// Ancestors that are not data structures themselves
    pub fn ancestor_only(&self) -> BTreeSet<StructureId> {
        self.ancestors.difference(&self.data).copied().collect()
    }
}

/// Computes the [`MeshSet`] for a region table
pub struct MeshSetPlanner<'a> {
    graph: &'a StructureGraph,
    outline: StructureId,
}

impl<'a> MeshSetPlanner<'a> {
    pub fn new(graph: &'a StructureGraph, outline: StructureId) -> Self {
        Self { graph, outline }
    }

    pub fn plan(&self, regions: &RegionTable) -> MeshSet {
        let data: BTreeSet<StructureId> = regions.keys().copied().collect();
        let ancestors: BTreeSet<StructureId> = data
            .iter()
            .flat_map(|&id| self.graph.ancestors(id))
            .collect();
        MeshSet {
            data,
            ancestors,
            outline: self.outline,
        }
    }
}

/// Local geometry storage
pub trait MeshStore: Send + Sync {
    /// True if geometry for `id` is available in any form
    fn has_mesh(&self, id: StructureId) -> bool;

    /// Persist raw geometry for `id`
    fn store(&self, id: StructureId, bytes: &[u8]) -> MeshResult<()>;
}

/// Meshes as `<id>.obj` files in one directory
///
/// A converted `<id>.glb` next to it also counts as present.
#[derive(Debug, Clone)]
pub struct MeshDirectory {
    dir: PathBuf,
}

impl MeshDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn raw_path(&self, id: StructureId) -> PathBuf {
        self.dir.join(format!("{}.obj", id))
    }

    fn converted_path(&self, id: StructureId) -> PathBuf {
        self.dir.join(format!("{}.glb", id))
    }
}

impl MeshStore for MeshDirectory {
    fn has_mesh(&self, id: StructureId) -> bool {
        self.raw_path(id).exists() || self.converted_path(id).exists()
    }

    fn store(&self, id: StructureId, bytes: &[u8]) -> MeshResult<()> {
        std::fs::create_dir_all(&self.dir).map_err(|source| MeshError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let dest = self.raw_path(id);
        let tmp = dest.with_extension("obj.tmp");
        std::fs::write(&tmp, bytes)
            .and_then(|_| std::fs::rename(&tmp, &dest))
            .map_err(|source| MeshError::Io { path: dest, source })
    }
}

/// Throttling for geometry downloads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshPacing {
    /// Pause after every N successful downloads (0 disables pausing)
    pub every: usize,
    pub pause: Duration,
}

impl MeshPacing {
    pub fn none() -> Self {
        Self {
            every: 0,
            pause: Duration::ZERO,
        }
    }
}

/// Mesh manifest consumed by the viewer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshManifest {
    pub data_structures: Vec<StructureId>,
    pub ancestor_structures: Vec<StructureId>,
    pub no_mesh: Vec<StructureId>,
    pub root_id: StructureId,
}

impl MeshSet {
    /// Fetch missing geometry and report what is still unavailable
    ///
    /// Fetch and store failures are logged and end up in `no_mesh`; they
    /// never abort reconciliation.
    pub async fn reconcile(
        &self,
        store: &dyn MeshStore,
        source: &dyn GeometrySource,
        pacing: MeshPacing,
    ) -> MeshManifest {
        let targets = self.targets();
        let missing: Vec<StructureId> = targets.iter().copied().filter(|&id| !store.has_mesh(id)).collect();

        if missing.is_empty() {
            debug!(target: "brain-atlas-regions", "All {} meshes present", targets.len());
        } else {
            info!(target: "brain-atlas-regions", "Downloading {} missing meshes", missing.len());
        }

        let mut downloaded = 0usize;
        for id in missing {
            let bytes = match source.fetch_geometry(id).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(target: "brain-atlas-regions", "Failed to download mesh {}: {}", id, e);
                    continue;
                }
            };
            if let Err(e) = store.store(id, &bytes) {
                warn!(target: "brain-atlas-regions", "Failed to store mesh {}: {}", id, e);
                continue;
            }

            downloaded += 1;
            if pacing.every > 0 && downloaded % pacing.every == 0 {
                tokio::time::sleep(pacing.pause).await;
            }
        }

        let no_mesh: Vec<StructureId> = targets.iter().copied().filter(|&id| !store.has_mesh(id)).collect();

        info!(
            target: "brain-atlas-regions",
            "Meshes: {} data, {} ancestor-only, {} downloaded, {} unavailable",
            self.data.len(),
            self.ancestor_only().len(),
            downloaded,
            no_mesh.len()
        );

        MeshManifest {
            data_structures: self.data.iter().copied().collect(),
            ancestor_structures: self.ancestor_only().into_iter().collect(),
            no_mesh,
            root_id: self.outline,
        }
    }
}

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Consolidated output files in the data directory.
//!
//! Every file is written to a temporary sibling and renamed into place, so
//! readers never observe a half-written output.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use brain_atlas_config::OutputsConfig;
use brain_atlas_regions::{MeshManifest, RegionTable};
use brain_atlas_structures::AssetListing;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::consolidate::ElectrodeListing;
use crate::error::{SyncError, SyncResult};

/// Reader and writer of the consolidated outputs
#[derive(Debug, Clone)]
pub struct OutputStore {
    data_dir: PathBuf,
    names: OutputsConfig,
}

impl OutputStore {
    pub fn new(data_dir: impl Into<PathBuf>, names: &OutputsConfig) -> Self {
        Self {
            data_dir: data_dir.into(),
            names: names.clone(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.data_dir.join(&self.names.checkpoint_file)
    }

    pub fn assets_path(&self) -> PathBuf {
        self.data_dir.join(&self.names.assets_file)
    }

    pub fn electrodes_dir(&self) -> PathBuf {
        self.data_dir.join(&self.names.electrodes_dir)
    }

    pub fn electrode_manifest_path(&self) -> PathBuf {
        self.data_dir.join(&self.names.electrode_manifest_file)
    }

    pub fn regions_path(&self) -> PathBuf {
        self.data_dir.join(&self.names.regions_file)
    }

    pub fn mesh_manifest_path(&self) -> PathBuf {
        self.data_dir.join(&self.names.mesh_manifest_file)
    }

    pub fn structure_graph_path(&self) -> PathBuf {
        self.data_dir.join(&self.names.structure_graph_file)
    }

    /// Save the raw ontology payload as downloaded
    pub fn write_structure_graph(&self, raw: &serde_json::Value) -> SyncResult<()> {
        write_json(&self.structure_graph_path(), raw, false)
    }

    /// Previously published asset listing; empty if there is none
    pub fn load_assets(&self) -> SyncResult<AssetListing> {
        Ok(read_json(&self.assets_path())?.unwrap_or_default())
    }

    pub fn write_assets(&self, listing: &AssetListing) -> SyncResult<()> {
        write_json(&self.assets_path(), listing, false)?;
        info!(
            target: "brain-atlas-sync",
            "{}: {} dandisets, {} assets",
            self.names.assets_file,
            listing.len(),
            listing.values().map(Vec::len).sum::<usize>()
        );
        Ok(())
    }

    /// Previously published electrode shards, keyed by file stem
    pub fn load_electrodes(&self) -> SyncResult<ElectrodeListing> {
        let dir = self.electrodes_dir();
        let mut listing = ElectrodeListing::new();
        for (dataset_id, path) in shard_files(&dir)? {
            if let Some(coords) = read_json(&path)? {
                listing.insert(dataset_id, coords);
            }
        }
        Ok(listing)
    }

    /// Write one shard per dataset plus the manifest of shard ids
    ///
    /// Shards of datasets absent from `listing` are removed so the
    /// directory and the manifest always agree.
    pub fn write_electrodes(&self, listing: &ElectrodeListing) -> SyncResult<()> {
        let dir = self.electrodes_dir();
        std::fs::create_dir_all(&dir).map_err(|e| SyncError::output(&dir, e))?;

        for (dataset_id, coords) in listing {
            write_json(&dir.join(format!("{}.json", dataset_id)), coords, false)?;
        }

        for (dataset_id, path) in shard_files(&dir)? {
            if !listing.contains_key(&dataset_id) {
                std::fs::remove_file(&path).map_err(|e| SyncError::output(&path, e))?;
                debug!(target: "brain-atlas-sync", "Removed stale electrode shard {}", dataset_id);
            }
        }

        let manifest: Vec<&String> = listing.keys().collect();
        write_json(&self.electrode_manifest_path(), &manifest, false)?;

        info!(
            target: "brain-atlas-sync",
            "{}/: {} files, {} assets",
            self.names.electrodes_dir,
            listing.len(),
            listing.values().map(|assets| assets.len()).sum::<usize>()
        );
        Ok(())
    }

    /// Split a legacy single-file electrode listing into shards
    ///
    /// Existing shards are kept unless the legacy file has the same dataset.
    /// The legacy file is removed afterwards. Returns `None` when there is
    /// no legacy file, else the number of datasets migrated.
    pub fn migrate_legacy_electrodes(&self, legacy: &Path) -> SyncResult<Option<usize>> {
        let Some(legacy_listing) = read_json::<ElectrodeListing>(legacy)? else {
            return Ok(None);
        };
        let migrated = legacy_listing.len();

        let mut listing = self.load_electrodes()?;
        listing.extend(legacy_listing);
        self.write_electrodes(&listing)?;

        std::fs::remove_file(legacy).map_err(|e| SyncError::output(legacy, e))?;
        info!(
            target: "brain-atlas-sync",
            "Migrated {} dandisets from {}",
            migrated,
            legacy.display()
        );
        Ok(Some(migrated))
    }

    pub fn write_regions(&self, regions: &RegionTable) -> SyncResult<()> {
        write_json(&self.regions_path(), regions, true)?;
        info!(
            target: "brain-atlas-sync",
            "{}: {} structures with data",
            self.names.regions_file,
            regions.len()
        );
        Ok(())
    }

    pub fn write_mesh_manifest(&self, manifest: &MeshManifest) -> SyncResult<()> {
        write_json(&self.mesh_manifest_path(), manifest, true)
    }
}

/// `(dataset id, path)` of every `*.json` shard in `dir`
fn shard_files(dir: &Path) -> SyncResult<Vec<(String, PathBuf)>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(SyncError::output(dir, e)),
    };

    let mut shards = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| SyncError::output(dir, e))?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()).map(str::to_string) else {
            continue;
        };
        shards.push((stem, path));
    }
    shards.sort();
    Ok(shards)
}

/// Parse a JSON file; `None` if missing or unreadable as `T`
fn read_json<T: DeserializeOwned>(path: &Path) -> SyncResult<Option<T>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(SyncError::output(path, e)),
    };
    match serde_json::from_slice(&bytes) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!(target: "brain-atlas-sync", "Ignoring malformed {}: {}", path.display(), e);
            Ok(None)
        }
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T, pretty: bool) -> SyncResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| SyncError::output(parent, e))?;
        }
    }

    let bytes = if pretty {
        serde_json::to_vec_pretty(value)?
    } else {
        serde_json::to_vec(value)?
    };

    let mut tmp = OsString::from(path.as_os_str());
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, bytes).map_err(|e| SyncError::output(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| SyncError::output(path, e))?;
    Ok(())
}

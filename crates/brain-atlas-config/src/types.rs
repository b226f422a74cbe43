// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! Every struct maps to a section of `brain_atlas_configuration.toml`. All
//! sections are `#[serde(default)]`, so a partial file only overrides what it
//! names.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AtlasConfig {
    pub system: SystemConfig,
    pub catalog: CatalogConfig,
    pub retry: RetryConfig,
    pub ontology: OntologyConfig,
    pub geometry: GeometryConfig,
    pub sync: SyncConfig,
    pub extractor: ExtractorConfig,
    pub outputs: OutputsConfig,
    pub logging: LoggingConfig,
}

impl AtlasConfig {
    /// Directory holding the geometry resources (`<data_dir>/<mesh_dir>`)
    pub fn mesh_dir(&self) -> PathBuf {
        self.system.data_dir.join(&self.geometry.mesh_dir)
    }
}

/// Filesystem roots and global log level
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Consolidated outputs (asset listing, regions, meshes, checkpoint)
    pub data_dir: PathBuf,
    /// Append-only cache logs
    pub cache_dir: PathBuf,
    pub log_level: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            cache_dir: PathBuf::from("cache"),
            log_level: "info".to_string(),
        }
    }
}

/// Dataset catalog (DANDI REST API)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub api_url: String,
    /// Dataset version used for asset listing and download locators
    pub version: String,
    pub dataset_page_size: usize,
    pub asset_page_size: usize,
    /// Server-side glob applied to asset listings
    pub asset_glob: String,
    /// Client-side suffix filter applied to asset paths
    pub asset_suffix: String,
    pub request_timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.dandiarchive.org/api".to_string(),
            version: "draft".to_string(),
            dataset_page_size: 200,
            asset_page_size: 100,
            asset_glob: "*.nwb".to_string(),
            asset_suffix: ".nwb".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Retry contract for catalog and content network calls
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    /// Wait before attempt `n + 1` is `backoff_step_secs * n`
    pub backoff_step_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_step_secs: 2,
        }
    }
}

/// Anatomical ontology source
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OntologyConfig {
    pub structure_graph_url: String,
    /// Whole-organ outline, always part of the mesh target set
    pub outline_structure_id: u32,
    /// Structures never listed as an asset's region (root, generic grey matter)
    pub hidden_region_ids: Vec<u32>,
    pub request_timeout_secs: u64,
}

impl Default for OntologyConfig {
    fn default() -> Self {
        Self {
            structure_graph_url: "http://api.brain-map.org/api/v2/structure_graph_download/1.json"
                .to_string(),
            outline_structure_id: 997,
            hidden_region_ids: vec![997, 8],
            request_timeout_secs: 60,
        }
    }
}

/// Geometry (mesh) source and local mesh directory
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Must contain the `{structure_id}` placeholder
    pub mesh_url_template: String,
    /// Relative to `system.data_dir`
    pub mesh_dir: PathBuf,
    /// Pause after every N successful downloads (0 disables pausing)
    pub pause_every: usize,
    pub pause_millis: u64,
    pub user_agent: String,
    pub request_timeout_secs: u64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            mesh_url_template: "http://download.alleninstitute.org/informatics-archive/\
                current-release/mouse_ccf/annotation/ccf_2017/structure_meshes/{structure_id}.obj"
                .to_string(),
            mesh_dir: PathBuf::from("meshes"),
            pause_every: 10,
            pause_millis: 500,
            user_agent: "brain-atlas-viewer/1.0".to_string(),
            request_timeout_secs: 60,
        }
    }
}

/// Synchronization behaviour
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Bounded worker pool size for post-probe assets
    pub workers: usize,
    /// Number of assets processed sequentially before the early-stop decision
    pub probe_size: usize,
    /// NCBI taxonomy id a dataset must declare to be processed
    pub species_taxon: String,
    /// Start with empty cache indices (logs are still appended)
    pub bypass_cache: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            probe_size: 5,
            species_taxon: "10090".to_string(),
            bypass_cache: false,
        }
    }
}

/// External content extraction helper
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Program invoked as `<program> <args..> locations|coordinates <locator>`
    pub program: String,
    pub args: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            program: "nwb-extract".to_string(),
            args: Vec::new(),
            timeout_secs: 300,
        }
    }
}

/// Output file names inside `system.data_dir`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputsConfig {
    pub assets_file: String,
    pub electrodes_dir: String,
    pub electrode_manifest_file: String,
    pub regions_file: String,
    pub mesh_manifest_file: String,
    pub structure_graph_file: String,
    pub checkpoint_file: String,
    pub label_cache_file: String,
    pub electrode_cache_file: String,
}

impl Default for OutputsConfig {
    fn default() -> Self {
        Self {
            assets_file: "dandiset_assets.json".to_string(),
            electrodes_dir: "electrodes".to_string(),
            electrode_manifest_file: "dandisets_with_electrodes.json".to_string(),
            regions_file: "dandi_regions.json".to_string(),
            mesh_manifest_file: "mesh_manifest.json".to_string(),
            structure_graph_file: "structure_graph.json".to_string(),
            checkpoint_file: "last_updated.json".to_string(),
            label_cache_file: "label_cache.jsonl".to_string(),
            electrode_cache_file: "electrode_cache.jsonl".to_string(),
        }
    }
}

/// Log files and retention
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file_logging: bool,
    pub log_dir: PathBuf,
    pub retention_days: u64,
    pub retention_runs: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file_logging: false,
            log_dir: PathBuf::from("logs"),
            retention_days: 30,
            retention_runs: 10,
        }
    }
}

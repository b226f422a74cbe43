//! # brain-atlas
//!
//! Keeps a mouse-brain atlas viewer in step with the DANDI neurophysiology
//! archive. Each run lists datasets, extracts the recorded brain locations of
//! every NWB asset, maps them onto the Allen CCF structure ontology and
//! publishes per-region statistics plus the set of structure meshes to draw.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! brain-atlas = "0.1"
//! ```
//!
//! ```rust,no_run
//! use brain_atlas::prelude::*;
//!
//! # async fn sync() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config(None, None)?;
//! validate_config(&config)?;
//!
//! let request = SyncRequest::from_config(SyncMode::Incremental, &config);
//! let report = SyncOrchestrator::from_config(config)?.run(&request).await?;
//! println!("{}", report);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: config, observability, structures          │
//! │  (settings, logging, ontology + location matching)      │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Infrastructure: services, cache                        │
//! │  (catalog/extractor/atlas clients, append-only logs)    │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Algorithms: regions, sync                              │
//! │  (aggregation, mesh planning, run orchestration)        │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Binaries
//!
//! - **`atlas_sync`**: full, incremental or targeted synchronization run
//! - **`migrate_electrodes`**: split a legacy electrode listing into shards
//!
//! ## License
//!
//! Apache-2.0

pub use brain_atlas_cache as cache;
pub use brain_atlas_config as config;
pub use brain_atlas_observability as observability;
pub use brain_atlas_regions as regions;
pub use brain_atlas_services as services;
pub use brain_atlas_structures as structures;
pub use brain_atlas_sync as sync;

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::config::{load_config, validate_config, AtlasConfig};
    pub use crate::regions::{MeshManifest, MeshSetPlanner, RegionAggregator, RegionTable};
    pub use crate::services::{CatalogService, ContentExtractor, GeometrySource, OntologySource};
    pub use crate::structures::{LocationMatcher, StructureGraph, StructureId};
    pub use crate::sync::{SyncMode, SyncOrchestrator, SyncReport, SyncRequest};
}

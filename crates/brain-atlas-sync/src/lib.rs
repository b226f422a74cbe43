// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # brain-atlas-sync
//!
//! Synchronization engine of the atlas. [`SyncOrchestrator`] turns catalog
//! datasets into the consolidated outputs the viewer reads:
//!
//! | File | Content |
//! |---|---|
//! | `dandiset_assets.json` | assets per dataset with their matched regions |
//! | `electrodes/<id>.json` | electrode coordinates per asset |
//! | `dandisets_with_electrodes.json` | datasets having an electrode shard |
//! | `dandi_regions.json` | direct and propagated region statistics |
//! | `mesh_manifest.json` | structures to draw and those without geometry |
//! | `structure_graph.json` | the ontology as downloaded |
//! | `last_updated.json` | checkpoint of the last run |
//!
//! ## Example
//!
//! ```no_run
//! use brain_atlas_config::AtlasConfig;
//! use brain_atlas_sync::{SyncMode, SyncOrchestrator, SyncRequest};
//!
//! # async fn example() -> Result<(), brain_atlas_sync::SyncError> {
//! let config = AtlasConfig::default();
//! let request = SyncRequest::from_config(SyncMode::Incremental, &config);
//! let report = SyncOrchestrator::from_config(config)?.run(&request).await?;
//! println!("{}", report);
//! # Ok(())
//! # }
//! ```

pub mod consolidate;
pub mod error;
pub mod exclusions;
pub mod orchestrator;
pub mod outputs;
pub mod request;
pub mod worker;

pub use consolidate::{build_asset_listing, build_electrode_listing, carry_forward, ElectrodeListing};
pub use error::{SyncError, SyncResult};
pub use exclusions::{ExclusionPredicate, ExclusionRules};
pub use orchestrator::SyncOrchestrator;
pub use outputs::OutputStore;
pub use request::{RunOutcome, SyncMode, SyncReport, SyncRequest};
pub use worker::AssetWorker;

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # brain-atlas-regions
//!
//! Everything computed from the consolidated asset listing:
//!
//! - [`RegionAggregator`]: per-structure direct counts plus totals
//!   propagated to every ancestor
//! - [`MeshSetPlanner`]: the structures needing geometry, reconciled against
//!   a local [`MeshStore`]

pub mod aggregator;
pub mod error;
pub mod mesh;

pub use aggregator::{RegionAggregator, RegionSummary, RegionTable, DEFAULT_REGION_COLOR};
pub use error::{MeshError, MeshResult};
pub use mesh::{MeshDirectory, MeshManifest, MeshPacing, MeshSet, MeshSetPlanner, MeshStore};

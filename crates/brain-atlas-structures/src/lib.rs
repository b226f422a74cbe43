// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # brain-atlas-structures
//!
//! The core data types of the atlas engine:
//!
//! - [`StructureGraph`]: the anatomical ontology tree with id/name/acronym
//!   indices and ancestor/descendant queries
//! - [`LocationMatcher`]: resolves free-text recording locations to ontology nodes
//! - [`AssetEntry`] / [`RegionRef`]: the per-asset records of the consolidated listing

pub mod assets;
pub mod error;
pub mod graph;
pub mod matcher;

pub use assets::{description_of, session_of, subject_of, AssetEntry, AssetListing, RegionRef};
pub use error::{StructureError, StructureResult};
pub use graph::{RawStructure, StructureGraph, StructureId, StructureNode};
pub use matcher::{extract_area, is_placeholder, LocationMatcher, PLACEHOLDER_LOCATIONS};

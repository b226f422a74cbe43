// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
# brain-atlas-services

Collaborator boundary of the atlas engine. Each external system is reached
through a trait so the orchestrator can run against real services or
in-process fakes:

- [`CatalogService`]: paginated dataset and asset listings, dataset metadata,
  download locators
- [`ContentExtractor`]: recording locations and electrode coordinates of one asset
- [`OntologySource`]: the raw anatomical structure tree
- [`GeometrySource`]: raw geometry for one structure

Implementations live in [`impls`]; the HTTP ones share a [`RetryPolicy`].
*/

pub mod electrodes;
pub mod impls;
pub mod paging;
pub mod retry;
pub mod traits;
pub mod types;

pub use electrodes::{filter_anatomical_coordinates, round_tenth};
pub use impls::{AllenAtlasClient, CommandContentExtractor, DandiCatalogClient};
pub use paging::{
    collect_all_datasets, collect_assets, dataset_has_species, datasets_modified_since,
    metadata_has_species,
};
pub use retry::RetryPolicy;
pub use traits::{CatalogService, ContentExtractor, GeometrySource, OntologySource};
pub use types::*;

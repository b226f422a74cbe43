/*!
Collaborator implementations.

Copyright 2025 Neuraville Inc.
Licensed under the Apache License, Version 2.0
*/

pub mod allen_atlas;
pub mod command_extractor;
pub mod dandi_catalog;

pub use allen_atlas::AllenAtlasClient;
pub use command_extractor::CommandContentExtractor;
pub use dandi_catalog::DandiCatalogClient;

/*!
Collaborator trait definitions.

These traits are the boundary between the synchronization engine and the
systems it talks to. All of them are object-safe and shared as `Arc<dyn _>`.

Copyright 2025 Neuraville Inc.
Licensed under the Apache License, Version 2.0
*/

pub mod catalog_service;
pub mod content_extractor;
pub mod geometry_source;
pub mod ontology_source;

// Re-export for convenience
pub use catalog_service::CatalogService;
pub use content_extractor::ContentExtractor;
pub use geometry_source::GeometrySource;
pub use ontology_source::OntologySource;

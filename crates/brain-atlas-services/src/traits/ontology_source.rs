/*!
Ontology source trait.

Copyright 2025 Neuraville Inc.
Licensed under the Apache License, Version 2.0
*/

use crate::types::*;
use async_trait::async_trait;

/// Provider of the anatomical structure tree
#[async_trait]
pub trait OntologySource: Send + Sync {
    /// Fetch the nested structure tree
    ///
    /// # Returns
    /// * The raw payload: either the root list or a `{"msg": [...]}` envelope
    ///
    async fn fetch_structure_graph(&self) -> ServiceResult<serde_json::Value>;
}

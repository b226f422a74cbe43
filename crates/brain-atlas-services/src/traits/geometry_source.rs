/*!
Geometry source trait.

Copyright 2025 Neuraville Inc.
Licensed under the Apache License, Version 2.0
*/

use crate::types::*;
use async_trait::async_trait;

/// Provider of raw per-structure geometry
#[async_trait]
pub trait GeometrySource: Send + Sync {
    /// Fetch the raw geometry of one structure
    ///
    /// # Errors
    /// * `ServiceError::NotFound` - No geometry exists for this structure
    ///
    async fn fetch_geometry(&self, structure_id: u32) -> ServiceResult<Vec<u8>>;
}

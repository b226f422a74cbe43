/*!
Content extraction trait.

Copyright 2025 Neuraville Inc.
Licensed under the Apache License, Version 2.0
*/

use crate::types::*;
use async_trait::async_trait;

/// Reads anatomical metadata out of a remote recording file
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// Recording location strings, grouped by modality
    ///
    /// An asset without location metadata yields an empty [`LocationSet`],
    /// not an error.
    ///
    /// # Errors
    /// * `ServiceError::Extraction` - The file could not be read
    /// * `ServiceError::Timeout` - The read exceeded its time budget
    ///
    async fn extract_locations(&self, locator: &str) -> ServiceResult<LocationSet>;

    /// Raw electrode coordinates in file order
    ///
    /// Rows may contain non-finite values; callers filter them with
    /// [`crate::filter_anatomical_coordinates`]. Empty when the file has
    /// no electrode table.
    ///
    async fn extract_coordinates(&self, locator: &str) -> ServiceResult<Vec<Coordinate>>;
}

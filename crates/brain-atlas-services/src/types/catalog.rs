// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Catalog listing types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque continuation token of a paginated listing
pub type PageCursor = String;

/// One page of a paginated listing
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Absent on the last page
    pub next: Option<PageCursor>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }
}

/// Dataset as listed by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub identifier: String,
    pub modified: DateTime<Utc>,
}

/// Asset as listed by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSummary {
    pub asset_id: String,
    pub path: String,
}

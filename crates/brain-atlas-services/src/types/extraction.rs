// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Content extraction results.

use serde::{Deserialize, Serialize};

/// Raw location strings of one asset, grouped by recording modality
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationSet {
    #[serde(default)]
    pub imaging: Vec<String>,
    #[serde(default)]
    pub electrodes: Vec<String>,
    #[serde(default)]
    pub icephys: Vec<String>,
}

impl LocationSet {
    pub fn is_empty(&self) -> bool {
        self.imaging.is_empty() && self.electrodes.is_empty() && self.icephys.is_empty()
    }

    /// Every location string, without repeats, in modality order
    pub fn unique(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.imaging
            .iter()
            .chain(&self.electrodes)
            .chain(&self.icephys)
            .map(String::as_str)
            .filter(|loc| seen.insert(*loc))
            .collect()
    }
}

/// One electrode position (x, y, z)
pub type Coordinate = [f64; 3];

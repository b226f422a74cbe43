// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Dataset-specific asset exclusions.
//!
//! Some datasets publish legacy file variants next to the canonical files.
//! Those variants duplicate data (often with stale localization) and are
//! dropped before the work list is built.

use std::collections::HashMap;

/// Predicate over an asset's file name (last path segment)
pub type ExclusionPredicate = fn(&str) -> bool;

/// Exclusion predicates keyed by dataset id
#[derive(Clone, Default)]
pub struct ExclusionRules {
    rules: HashMap<String, ExclusionPredicate>,
}

impl ExclusionRules {
    /// No exclusions
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules for the datasets known to carry duplicate legacy variants
    pub fn with_defaults() -> Self {
        let mut rules = Self::new();
        rules.insert("000409", ibl_legacy_variant);
        rules
    }

    pub fn insert(&mut self, dataset_id: impl Into<String>, predicate: ExclusionPredicate) {
        self.rules.insert(dataset_id.into(), predicate);
    }

    /// True if the asset at `path` must be skipped
    pub fn excludes(&self, dataset_id: &str, path: &str) -> bool {
        let Some(predicate) = self.rules.get(dataset_id) else {
            return false;
        };
        let file_name = path.rsplit('/').next().unwrap_or(path);
        predicate(file_name)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl std::fmt::Debug for ExclusionRules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut datasets: Vec<&String> = self.rules.keys().collect();
        datasets.sort();
        f.debug_struct("ExclusionRules").field("datasets", &datasets).finish()
    }
}

/// Legacy IBL variants that duplicate the `desc-raw` / `desc-processed` files
fn ibl_legacy_variant(file_name: &str) -> bool {
    file_name.ends_with("-processed-only_behavior.nwb")
        || file_name.contains("_behavior+ecephys+image.nwb")
        || file_name.contains("_ecephys+image.nwb")
        || file_name.contains("-raw-only_ecephys+image.nwb")
        || (file_name.contains("_behavior+ecephys.nwb") && !file_name.contains("_desc-processed_"))
}

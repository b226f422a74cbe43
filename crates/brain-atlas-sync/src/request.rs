// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Run requests and the end-of-run report.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use brain_atlas_cache::CheckpointMode;
use brain_atlas_config::AtlasConfig;
use serde::{Deserialize, Serialize};

/// Which datasets a run considers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncMode {
    /// Every dataset in the catalog; caches start empty
    Full,
    /// Datasets modified since the last checkpoint; degrades to `Full`
    /// when no checkpoint exists
    Incremental,
    /// An explicit set of dataset ids; caches are kept
    Targeted(BTreeSet<String>),
}

impl SyncMode {
    pub fn checkpoint_mode(&self) -> CheckpointMode {
        match self {
            SyncMode::Full => CheckpointMode::Full,
            SyncMode::Incremental => CheckpointMode::Incremental,
            SyncMode::Targeted(_) => CheckpointMode::Targeted,
        }
    }
}

/// Parameters of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    pub mode: SyncMode,
    /// Worker pool size for post-probe assets
    pub workers: usize,
    /// Start with empty cache indices
    pub bypass_cache: bool,
}

impl SyncRequest {
    /// Request using the configured worker count and cache policy
    pub fn from_config(mode: SyncMode, config: &AtlasConfig) -> Self {
        Self {
            mode,
            workers: config.sync.workers,
            bypass_cache: config.sync.bypass_cache,
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Outputs were rebuilt
    Completed,
    /// Incremental run found no modified datasets
    NoChanges,
    /// No targeted dataset passed the species filter
    NoEligibleDatasets,
}

/// Summary of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    pub mode: CheckpointMode,
    pub outcome: RunOutcome,
    pub dandisets_checked: usize,
    pub dandisets_updated: usize,
    pub assets_processed: usize,
    pub cache_hits: usize,
    /// Recorded assets with error status
    pub errors: usize,
    /// Datasets whose processing phase was aborted, with the reason
    pub failures: BTreeMap<String, String>,
    /// Datasets that stopped after the probe phase
    pub early_stopped: BTreeSet<String>,
    pub regions: usize,
    pub missing_meshes: usize,
    pub elapsed: Duration,
}

impl SyncReport {
    pub(crate) fn new(mode: CheckpointMode, outcome: RunOutcome) -> Self {
        Self {
            mode,
            outcome,
            dandisets_checked: 0,
            dandisets_updated: 0,
            assets_processed: 0,
            cache_hits: 0,
            errors: 0,
            failures: BTreeMap::new(),
            early_stopped: BTreeSet::new(),
            regions: 0,
            missing_meshes: 0,
            elapsed: Duration::ZERO,
        }
    }
}

impl std::fmt::Display for SyncReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Done! ({:.0}s)", self.elapsed.as_secs_f64())?;
        writeln!(f, "  Dandisets checked: {}", self.dandisets_checked)?;
        writeln!(f, "  Dandisets updated: {}", self.dandisets_updated)?;
        writeln!(f, "  Assets processed: {}", self.assets_processed)?;
        writeln!(f, "  Cache hits: {}", self.cache_hits)?;
        write!(f, "  Errors: {}", self.errors)?;
        if !self.early_stopped.is_empty() {
            write!(f, "\n  Stopped after probe: {}", self.early_stopped.len())?;
        }
        if self.outcome == RunOutcome::Completed {
            write!(
                f,
                "\n  Regions: {}, meshes unavailable: {}",
                self.regions, self.missing_meshes
            )?;
        }
        for (dataset_id, reason) in &self.failures {
            write!(f, "\n  FAILED {}: {}", dataset_id, reason)?;
        }
        Ok(())
    }
}

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Cache service: both caches and the run counters behind one lock.
//!
//! Callers hold the lock only for a check or a record step. Network work
//! happens between those steps, never inside them.

use std::collections::BTreeSet;
use std::path::Path;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::entries::{CacheKey, ElectrodeEntry, LabelEntry, LabelStatus};
use crate::error::CacheResult;
use crate::log::AssetCache;

/// How to initialize the in-memory indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLoad {
    /// Replay the logs
    Warm,
    /// Start empty; the logs are kept and still appended to
    Empty,
}

/// Counters for the current run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    /// Assets fetched and recorded in this run
    pub assets_processed: usize,
    /// Recorded assets whose label entry has error status
    pub errors: usize,
    /// Assets skipped because a cached entry existed
    pub cache_hits: usize,
}

struct CacheState {
    labels: AssetCache<LabelEntry>,
    electrodes: AssetCache<ElectrodeEntry>,
    counters: RunCounters,
}

/// Shared, lock-protected access to both cache kinds
pub struct CacheService {
    state: Mutex<CacheState>,
}

impl CacheService {
    pub fn open(label_log: &Path, electrode_log: &Path, load: CacheLoad) -> CacheResult<Self> {
        let (labels, electrodes) = match load {
            CacheLoad::Warm => (AssetCache::open(label_log)?, AssetCache::open(electrode_log)?),
            CacheLoad::Empty => (
                AssetCache::open_empty(label_log)?,
                AssetCache::open_empty(electrode_log)?,
            ),
        };

        info!(
            target: "brain-atlas-cache",
            "Cache ready ({:?}): {} label entries, {} electrode entries",
            load,
            labels.len(),
            electrodes.len()
        );

        Ok(Self {
            state: Mutex::new(CacheState {
                labels,
                electrodes,
                counters: RunCounters::default(),
            }),
        })
    }

    /// Status of the cached label entry, if any
    ///
    /// A hit means the asset must not be fetched again in this run.
    pub fn check_and_skip(&self, key: &CacheKey) -> Option<LabelStatus> {
        let mut state = self.state.lock();
        let status = state.labels.get(key).map(|entry| entry.status)?;
        state.counters.cache_hits += 1;
        Some(status)
    }

    /// Append both results of one asset and update the counters
    ///
    /// The label entry is the skip key, so it is written last: an asset
    /// whose electrode append failed is fetched again on the next run.
    pub fn record(&self, label: LabelEntry, electrode: ElectrodeEntry) -> CacheResult<()> {
        let mut state = self.state.lock();
        let failed = label.status == LabelStatus::Error;
        state.electrodes.append(electrode)?;
        state.labels.append(label)?;
        state.counters.assets_processed += 1;
        if failed {
            state.counters.errors += 1;
        }
        Ok(())
    }

    /// Drop indexed entries of the given datasets from both caches
    ///
    /// Returns (label entries, electrode entries) removed.
    pub fn invalidate(&self, dataset_ids: &BTreeSet<String>) -> (usize, usize) {
        let mut state = self.state.lock();
        let labels = state.labels.invalidate(dataset_ids);
        let electrodes = state.electrodes.invalidate(dataset_ids);
        if labels > 0 || electrodes > 0 {
            debug!(
                target: "brain-atlas-cache",
                "Invalidated {} label and {} electrode entries for {} datasets",
                labels,
                electrodes,
                dataset_ids.len()
            );
        }
        (labels, electrodes)
    }

    pub fn counters(&self) -> RunCounters {
        self.state.lock().counters
    }

    /// Indexed label entries ordered by key
    pub fn label_snapshot(&self) -> Vec<LabelEntry> {
        self.state.lock().labels.snapshot()
    }

    /// Indexed electrode entries ordered by key
    pub fn electrode_snapshot(&self) -> Vec<ElectrodeEntry> {
        self.state.lock().electrodes.snapshot()
    }

    /// Number of indexed (label, electrode) entries
    pub fn len(&self) -> (usize, usize) {
        let state = self.state.lock();
        (state.labels.len(), state.electrodes.len())
    }
}

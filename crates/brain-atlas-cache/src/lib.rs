// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # brain-atlas-cache
//!
//! Durable per-asset results.
//!
//! Each result kind is stored as a newline-delimited JSON log that is only
//! ever appended to. Opening a log replays it into an in-memory index keyed
//! by (dataset id, asset id); a later record for the same key replaces the
//! earlier one. Invalidation edits the index only, so the log stays the
//! source of truth and the next processing pass appends superseding records.
//!
//! [`CacheService`] wraps both logs and the run counters behind one lock.

pub mod checkpoint;
pub mod entries;
pub mod error;
pub mod log;
pub mod service;

pub use checkpoint::{Checkpoint, CheckpointMode};
pub use entries::{CacheKey, CacheRecord, ElectrodeEntry, LabelEntry, LabelStatus};
pub use error::{CacheError, CacheResult};
pub use log::AssetCache;
pub use service::{CacheLoad, CacheService, RunCounters};

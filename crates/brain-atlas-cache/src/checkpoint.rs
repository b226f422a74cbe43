// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Synchronization checkpoint (`last_updated.json`).

use std::path::Path;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CacheError, CacheResult};

/// Mode of the run that wrote a checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointMode {
    Full,
    Incremental,
    Targeted,
}

/// Marker of the last completed synchronization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    #[serde(with = "second_precision")]
    pub timestamp: DateTime<Utc>,
    pub mode: CheckpointMode,
    pub dandisets_checked: usize,
    pub dandisets_updated: usize,
    pub assets_processed: usize,
}

impl Checkpoint {
    /// Checkpoint stamped with the current time
    pub fn now(
        mode: CheckpointMode,
        dandisets_checked: usize,
        dandisets_updated: usize,
        assets_processed: usize,
    ) -> Self {
        Self {
            timestamp: Utc::now().trunc_subsecs(0),
            mode,
            dandisets_checked,
            dandisets_updated,
            assets_processed,
        }
    }

    /// Read a checkpoint; `None` if the file does not exist
    pub fn load(path: &Path) -> CacheResult<Option<Self>> {
        match std::fs::read(path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::io(path, e)),
        }
    }

    /// Write the checkpoint through a temporary file and rename
    pub fn save(&self, path: &Path) -> CacheResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| CacheError::io(parent, e))?;
            }
        }
        let json = serde_json::to_vec_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| CacheError::io(&tmp, e))?;
        std::fs::rename(&tmp, path).map_err(|e| CacheError::io(path, e))?;
        Ok(())
    }
}

mod second_precision {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let text = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&text)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use brain_atlas_cache::CacheError;
use brain_atlas_regions::MeshError;
use brain_atlas_services::ServiceError;
use thiserror::Error;

/// Synchronization errors
///
/// Only [`SyncError::Ontology`] and failures that leave nothing to do
/// (target discovery, unreadable cache logs, unwritable outputs) end a run.
/// Per-asset and per-dataset failures are recorded and the run continues.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Structure ontology unavailable: {0}")]
    Ontology(String),

    #[error("Catalog unavailable: {0}")]
    Catalog(#[from] ServiceError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error("Output I/O error on {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Worker failed: {0}")]
    Worker(String),
}

impl SyncError {
    pub(crate) fn output(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Output {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Serialization(err.to_string())
    }
}

/// Result type for synchronization
pub type SyncResult<T> = Result<T, SyncError>;

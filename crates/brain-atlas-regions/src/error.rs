// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use thiserror::Error;

/// Mesh storage errors
#[derive(Error, Debug)]
pub enum MeshError {
    #[error("Mesh I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for mesh operations
pub type MeshResult<T> = Result<T, MeshError>;

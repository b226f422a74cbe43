// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # brain-atlas-observability
//!
//! Logging setup shared by every brain-atlas binary, with per-crate debug
//! flag support.
//!
//! ## Features
//! - `file-logging`: per-run log folders with one JSON file per crate

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

pub use cli::*;
pub use init::*;

/// Known crate names for debug flags (also used as `tracing` targets)
pub const KNOWN_CRATES: &[&str] = &[
    "brain-atlas-config",
    "brain-atlas-structures",
    "brain-atlas-services",
    "brain-atlas-cache",
    "brain-atlas-regions",
    "brain-atlas-sync",
];

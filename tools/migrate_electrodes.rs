// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Electrode Listing Migration Tool

Splits a monolithic `dandiset_electrodes.json` into one shard per dandiset
under `electrodes/`, writes `dandisets_with_electrodes.json` and removes the
legacy file.

Usage:
  cargo run --bin migrate_electrodes -- [--data-dir DIR] [--legacy FILE]

Copyright 2025 Neuraville Inc.
Licensed under the Apache License, Version 2.0
*/

use std::path::PathBuf;

use anyhow::{Context, Result};
use brain_atlas::config::OutputsConfig;
use brain_atlas::observability::{init_console_logging, parse_debug_flags};
use brain_atlas::sync::OutputStore;
use clap::Parser;

const LEGACY_FILE_NAME: &str = "dandiset_electrodes.json";

/// Convert the legacy electrode listing into per-dandiset shards
#[derive(Parser, Debug)]
#[command(name = "migrate_electrodes", version, long_about = None)]
struct Args {
    /// Data directory holding the consolidated outputs
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Legacy listing (defaults to <data-dir>/dandiset_electrodes.json)
    #[arg(long)]
    legacy: Option<PathBuf>,
}

fn main() -> Result<()> {
    let (debug_flags, rest) = parse_debug_flags();
    let args = Args::parse_from(rest);
    init_console_logging(&debug_flags, "info")?;

    let legacy = args
        .legacy
        .clone()
        .unwrap_or_else(|| args.data_dir.join(LEGACY_FILE_NAME));
    let store = OutputStore::new(&args.data_dir, &OutputsConfig::default());

    let migrated = store
        .migrate_legacy_electrodes(&legacy)
        .with_context(|| format!("Failed to migrate {}", legacy.display()))?;

    match migrated {
        Some(count) => {
            println!("Migrated {} dandisets", count);
            println!("  Shards:   {}", store.electrodes_dir().display());
            println!("  Manifest: {}", store.electrode_manifest_path().display());
        }
        None => println!("No legacy file at {}, nothing to do", legacy.display()),
    }
    Ok(())
}

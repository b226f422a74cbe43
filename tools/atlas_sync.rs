// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Atlas synchronization tool

Fetches the structure ontology, syncs DANDI datasets into the caches and
rebuilds the consolidated data files.

Usage:
  cargo run --bin atlas_sync -- [--mode full|incremental] [--dataset ID ...]
                                [--workers N] [--no-cache] [--data-dir DIR]
                                [--config PATH] [--debug-<crate>|--debug-all]

Examples:
  cargo run --bin atlas_sync -- --mode full
  cargo run --bin atlas_sync -- --dataset 000021 --dataset 000409 --no-cache

Copyright 2025 Neuraville Inc.
Licensed under the Apache License, Version 2.0
*/

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use anyhow::{Context, Result};
use brain_atlas::config::{
    apply_cli_overrides, apply_environment_overrides, find_config_file, load_config,
    validate_config, AtlasConfig, ConfigError,
};
use brain_atlas::observability::{debug_flags_help, parse_debug_flags, CrateDebugFlags};
use brain_atlas::sync::{SyncMode, SyncOrchestrator, SyncRequest};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    /// Re-process every dataset in the catalog
    Full,
    /// Only datasets modified since the last checkpoint
    Incremental,
}

/// Sync DANDI dataset assets against the mouse brain atlas
#[derive(Parser, Debug)]
#[command(name = "atlas_sync", version, long_about = None, after_help = debug_flags_help())]
struct Args {
    /// Configuration file (searched for when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Which datasets to consider
    #[arg(long, value_enum, default_value_t = ModeArg::Incremental)]
    mode: ModeArg,

    /// Process only these dataset ids (overrides --mode)
    #[arg(long = "dataset", value_name = "ID")]
    datasets: Vec<String>,

    /// Concurrent asset workers per dataset
    #[arg(long)]
    workers: Option<usize>,

    /// Ignore cached results (the cache logs are still appended to)
    #[arg(long, default_value_t = false)]
    no_cache: bool,

    /// Output directory for the consolidated data files
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

impl Args {
    fn sync_mode(&self) -> SyncMode {
        if !self.datasets.is_empty() {
            return SyncMode::Targeted(self.datasets.iter().cloned().collect::<BTreeSet<_>>());
        }
        match self.mode {
            ModeArg::Full => SyncMode::Full,
            ModeArg::Incremental => SyncMode::Incremental,
        }
    }

    /// CLI overrides in the config loader's string-map form
    fn overrides(&self) -> HashMap<String, String> {
        let mut cli = HashMap::new();
        if let Some(workers) = self.workers {
            cli.insert("workers".to_string(), workers.to_string());
        }
        if self.no_cache {
            cli.insert("bypass_cache".to_string(), "true".to_string());
        }
        if let Some(dir) = &self.data_dir {
            cli.insert("data_dir".to_string(), dir.display().to_string());
        }
        cli
    }
}

/// Load the configuration file, or defaults when none exists
fn resolve_config(args: &Args) -> Result<(AtlasConfig, Option<PathBuf>)> {
    let cli = args.overrides();
    let path = match &args.config {
        Some(path) => Some(path.clone()),
        None => match find_config_file() {
            Ok(path) => Some(path),
            Err(ConfigError::FileNotFound(_)) => None,
            Err(e) => return Err(e.into()),
        },
    };

    let config = match &path {
        Some(path) => load_config(Some(path.as_path()), Some(&cli))
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => {
            let mut config = AtlasConfig::default();
            apply_environment_overrides(&mut config);
            apply_cli_overrides(&mut config, &cli);
            config
        }
    };

    validate_config(&config).context("Invalid configuration")?;
    Ok((config, path))
}

#[cfg(feature = "file-logging")]
type LogGuard = Option<brain_atlas::observability::LoggingGuard>;
#[cfg(not(feature = "file-logging"))]
type LogGuard = ();

fn init_tracing(flags: &CrateDebugFlags, config: &AtlasConfig) -> Result<LogGuard> {
    #[cfg(feature = "file-logging")]
    {
        if config.logging.file_logging {
            let guard = brain_atlas::observability::init_logging(
                flags,
                &config.system.log_level,
                &config.logging.log_dir,
                config.logging.retention_days,
                config.logging.retention_runs,
            )?;
            return Ok(Some(guard));
        }
        brain_atlas::observability::init_console_logging(flags, &config.system.log_level)?;
        Ok(None)
    }

    #[cfg(not(feature = "file-logging"))]
    {
        brain_atlas::observability::init_console_logging(flags, &config.system.log_level)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let (debug_flags, rest) = parse_debug_flags();
    let args = Args::parse_from(rest);

    let (config, config_path) = resolve_config(&args)?;
    let _log_guard = init_tracing(&debug_flags, &config)?;

    match &config_path {
        Some(path) => info!(target: "brain-atlas", "Config: {}", path.display()),
        None => warn!(target: "brain-atlas", "No configuration file found, using defaults"),
    }

    let request = SyncRequest::from_config(args.sync_mode(), &config);
    info!(
        target: "brain-atlas",
        "Data directory: {} (mode {:?}, {} workers{})",
        config.system.data_dir.display(),
        request.mode.checkpoint_mode(),
        request.workers,
        if request.bypass_cache { ", cache bypassed" } else { "" }
    );

    let orchestrator = SyncOrchestrator::from_config(config)?;
    let report = orchestrator.run(&request).await?;

    println!("{}", report);
    if !report.failures.is_empty() {
        warn!(
            target: "brain-atlas",
            "{} dandisets failed; their previous outputs were kept",
            report.failures.len()
        );
    }
    Ok(())
}

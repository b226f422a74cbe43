// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! 3-tier loading:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{AtlasConfig, ConfigError, ConfigResult, CONFIG_FILE_NAME};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Find the configuration file
///
/// Search order:
/// 1. `BRAIN_ATLAS_CONFIG_PATH` environment variable
/// 2. Current working directory
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("BRAIN_ATLAS_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by BRAIN_ATLAS_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));

        let mut current = cwd.clone();
        for _ in 0..5 {
            if let Some(parent) = current.parent() {
                search_paths.push(parent.join(CONFIG_FILE_NAME));
                current = parent.to_path_buf();
            }
        }
    }

    for path in &search_paths {
        if path.exists() {
            return Ok(path.clone());
        }
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet BRAIN_ATLAS_CONFIG_PATH to specify a custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from a TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, the file is searched for.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if the config file is not found or contains invalid TOML
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<AtlasConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: AtlasConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

fn parse_flag(value: &str) -> bool {
    let lowered = value.to_lowercase();
    lowered == "true" || lowered == "1" || lowered == "yes"
}

/// Apply environment variable overrides
///
/// Supported environment variables:
/// - `BRAIN_ATLAS_DATA_DIR` -> `system.data_dir`
/// - `BRAIN_ATLAS_CACHE_DIR` -> `system.cache_dir`
/// - `BRAIN_ATLAS_LOG_LEVEL` -> `system.log_level`
/// - `BRAIN_ATLAS_API_URL` -> `catalog.api_url`
/// - `BRAIN_ATLAS_WORKERS` -> `sync.workers`
/// - `BRAIN_ATLAS_PROBE_SIZE` -> `sync.probe_size`
/// - `BRAIN_ATLAS_SPECIES_TAXON` -> `sync.species_taxon`
/// - `BRAIN_ATLAS_BYPASS_CACHE` -> `sync.bypass_cache`
/// - `BRAIN_ATLAS_EXTRACTOR` -> `extractor.program`
pub fn apply_environment_overrides(config: &mut AtlasConfig) {
    if let Ok(value) = env::var("BRAIN_ATLAS_DATA_DIR") {
        config.system.data_dir = PathBuf::from(value);
    }
    if let Ok(value) = env::var("BRAIN_ATLAS_CACHE_DIR") {
        config.system.cache_dir = PathBuf::from(value);
    }
    if let Ok(value) = env::var("BRAIN_ATLAS_LOG_LEVEL") {
        config.system.log_level = value;
    }
    if let Ok(value) = env::var("BRAIN_ATLAS_API_URL") {
        config.catalog.api_url = value;
    }
    if let Ok(value) = env::var("BRAIN_ATLAS_WORKERS") {
        if let Ok(workers) = value.parse::<usize>() {
            config.sync.workers = workers;
        }
    }
    if let Ok(value) = env::var("BRAIN_ATLAS_PROBE_SIZE") {
        if let Ok(probe) = value.parse::<usize>() {
            config.sync.probe_size = probe;
        }
    }
    if let Ok(value) = env::var("BRAIN_ATLAS_SPECIES_TAXON") {
        config.sync.species_taxon = value;
    }
    if let Ok(value) = env::var("BRAIN_ATLAS_BYPASS_CACHE") {
        config.sync.bypass_cache = parse_flag(&value);
    }
    if let Ok(value) = env::var("BRAIN_ATLAS_EXTRACTOR") {
        config.extractor.program = value;
    }
}

/// Apply CLI argument overrides
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - Map of CLI arguments (e.g., `{"workers": "8", "data_dir": "/srv/atlas"}`)
pub fn apply_cli_overrides(config: &mut AtlasConfig, cli_args: &HashMap<String, String>) {
    if let Some(value) = cli_args.get("data_dir") {
        config.system.data_dir = PathBuf::from(value);
    }
    if let Some(value) = cli_args.get("cache_dir") {
        config.system.cache_dir = PathBuf::from(value);
    }
    if let Some(value) = cli_args.get("log_level") {
        config.system.log_level = value.clone();
    }
    if let Some(value) = cli_args.get("api_url") {
        config.catalog.api_url = value.clone();
    }
    if let Some(value) = cli_args.get("workers") {
        if let Ok(workers) = value.parse::<usize>() {
            config.sync.workers = workers;
        }
    }
    if let Some(value) = cli_args.get("probe_size") {
        if let Ok(probe) = value.parse::<usize>() {
            config.sync.probe_size = probe;
        }
    }
    if let Some(value) = cli_args.get("bypass_cache") {
        config.sync.bypass_cache = parse_flag(value);
    }
    if let Some(value) = cli_args.get("extractor") {
        config.extractor.program = value.clone();
    }
}

// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization
//!
//! Console logging is always available. With the `file-logging` feature,
//! each run also gets its own folder with per-crate JSON log files and
//! configurable retention.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;

const RUN_FOLDER_PREFIX: &str = "run_";
const RUN_FOLDER_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Initialize console-only logging
///
/// `base_level` applies to every crate not enabled through debug flags.
pub fn init_console_logging(debug_flags: &CrateDebugFlags, base_level: &str) -> Result<()> {
    let env_filter = EnvFilter::try_new(debug_flags.to_filter_string(base_level))
        .context("Invalid log filter")?;

    Registry::default()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_filter(env_filter),
        )
        .try_init()
        .context("Logging already initialized")?;

    Ok(())
}

/// Keeps the non-blocking file writers alive (they flush on drop)
#[cfg(feature = "file-logging")]
pub struct LoggingGuard {
    _file_guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
    log_dir: PathBuf,
}

#[cfg(feature = "file-logging")]
impl LoggingGuard {
    /// Folder of the current run
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }
}

/// Initialize logging with file output and console output
///
/// Creates a timestamped folder structure:
/// ```text
/// ./logs/
///   └── run_20250101_120000/
///       ├── brain-atlas-sync.log
///       ├── brain-atlas-cache.log
///       └── brain-atlas.log (combined)
/// ```
///
/// # Arguments
/// * `debug_flags` - Per-crate debug flags for filtering
/// * `base_level` - Level for crates without a debug flag
/// * `log_dir` - Base directory for logs
/// * `retention_days` - Remove run folders older than N days
/// * `retention_runs` - Keep at most N run folders
#[cfg(feature = "file-logging")]
pub fn init_logging(
    debug_flags: &CrateDebugFlags,
    base_level: &str,
    log_dir: &Path,
    retention_days: u64,
    retention_runs: usize,
) -> Result<LoggingGuard> {
    use tracing_appender::rolling;

    cleanup_old_logs(log_dir, retention_days, retention_runs)?;

    let timestamp = Utc::now().format(RUN_FOLDER_FORMAT);
    let run_folder = log_dir.join(format!("{}{}", RUN_FOLDER_PREFIX, timestamp));
    std::fs::create_dir_all(&run_folder)
        .with_context(|| format!("Failed to create log directory: {}", run_folder.display()))?;

    let filter = debug_flags.to_filter_string(base_level);
    let env_filter = EnvFilter::try_new(&filter).context("Invalid log filter")?;

    let mut layers = Vec::new();
    let mut file_guards = Vec::new();

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .with_filter(env_filter)
        .boxed();
    layers.push(console_layer);

    for crate_name in crate::KNOWN_CRATES {
        let file_appender = rolling::never(&run_folder, format!("{}.log", crate_name));
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        file_guards.push(guard);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .json()
            .with_filter(EnvFilter::new(format!("{}=debug,off", crate_name)))
            .boxed();
        layers.push(file_layer);
    }

    let combined_appender = rolling::never(&run_folder, "brain-atlas.log");
    let (combined_non_blocking, combined_guard) = tracing_appender::non_blocking(combined_appender);
    file_guards.push(combined_guard);

    let combined_layer = tracing_subscriber::fmt::layer()
        .with_writer(combined_non_blocking)
        .with_target(true)
        .json()
        .with_filter(EnvFilter::new(&filter))
        .boxed();
    layers.push(combined_layer);

    Registry::default()
        .with(layers)
        .try_init()
        .context("Logging already initialized")?;

    Ok(LoggingGuard {
        _file_guards: file_guards,
        log_dir: run_folder,
    })
}

/// Parse the timestamp out of a `run_YYYYmmdd_HHMMSS` folder name
fn run_folder_timestamp(dir_name: &str) -> Option<DateTime<Utc>> {
    let timestamp = dir_name.strip_prefix(RUN_FOLDER_PREFIX)?;
    let naive = NaiveDateTime::parse_from_str(timestamp, RUN_FOLDER_FORMAT).ok()?;
    Some(Utc.from_utc_datetime(&naive))
}

/// Remove run folders older than `retention_days`, then keep only the most
/// recent `retention_runs` of the rest
pub fn cleanup_old_logs(
    base_log_dir: &Path,
    retention_days: u64,
    retention_runs: usize,
) -> Result<()> {
    if !base_log_dir.exists() {
        return Ok(());
    }

    let cutoff_date = Utc::now() - chrono::Duration::days(retention_days as i64);

    let mut runs: Vec<(PathBuf, DateTime<Utc>)> = Vec::new();
    for entry in std::fs::read_dir(base_log_dir)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        if let Some(dt) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(run_folder_timestamp)
        {
            runs.push((path, dt));
        }
    }

    // newest first
    runs.sort_by(|a, b| b.1.cmp(&a.1));

    for (index, (path, dt)) in runs.iter().enumerate() {
        if *dt < cutoff_date || index >= retention_runs {
            if let Err(e) = std::fs::remove_dir_all(path) {
                eprintln!(
                    "Warning: Failed to remove old log directory {}: {}",
                    path.display(),
                    e
                );
            }
        }
    }

    Ok(())
}

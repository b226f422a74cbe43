//! CLI argument parsing for per-crate debug flags
//!
//! Supports flags like `--debug-brain-atlas-sync` or `--debug-all`.

use std::collections::BTreeSet;
use std::env;

use crate::KNOWN_CRATES;

/// Debug flags parsed from command-line arguments
///
/// # Example
/// ```rust
/// use brain_atlas_observability::CrateDebugFlags;
///
/// let flags = CrateDebugFlags::from_args(vec!["--debug-brain-atlas-cache".to_string()]);
/// assert!(flags.is_enabled("brain-atlas-cache"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CrateDebugFlags {
    pub enabled_crates: BTreeSet<String>,
}

impl CrateDebugFlags {
    /// Parse debug flags from command-line arguments
    ///
    /// Looks for `--debug-{crate-name}`; `--debug-all` enables every known crate.
    /// Other arguments are ignored.
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut flags = CrateDebugFlags::default();

        for arg in args {
            if arg == "--debug-all" {
                flags.enable_all();
                continue;
            }
            if let Some(crate_name) = arg.strip_prefix("--debug-") {
                flags.enabled_crates.insert(crate_name.to_string());
            }
        }

        flags
    }

    /// Merge crate names from a comma-separated list (`all` enables everything)
    pub fn merge_list(&mut self, list: &str) {
        if list.trim() == "all" {
            self.enable_all();
            return;
        }
        for crate_name in list.split(',') {
            let crate_name = crate_name.trim();
            if !crate_name.is_empty() {
                self.enabled_crates.insert(crate_name.to_string());
            }
        }
    }

    fn enable_all(&mut self) {
        for crate_name in KNOWN_CRATES {
            self.enabled_crates.insert(crate_name.to_string());
        }
    }

    /// Check if debug is enabled for a specific crate
    pub fn is_enabled(&self, crate_name: &str) -> bool {
        self.enabled_crates.contains(crate_name)
    }

    /// Check if debug is enabled for any crate
    pub fn any_enabled(&self) -> bool {
        !self.enabled_crates.is_empty()
    }

    /// Get log level for a crate
    pub fn log_level(&self, crate_name: &str) -> tracing::Level {
        if self.is_enabled(crate_name) {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Build an `EnvFilter` directive string
    ///
    /// Format: `brain-atlas-sync=debug,<base>` or just `<base>` if nothing is enabled.
    pub fn to_filter_string(&self, base_level: &str) -> String {
        let mut filters: Vec<String> = self
            .enabled_crates
            .iter()
            .map(|crate_name| format!("{}=debug", crate_name))
            .collect();
        filters.push(base_level.to_lowercase());
        filters.join(",")
    }
}

/// Split `--debug-*` flags out of an argument list
///
/// Returns the parsed flags and the remaining arguments, so a strict CLI
/// parser never sees the debug flags.
pub fn split_debug_args<I>(args: I) -> (CrateDebugFlags, Vec<String>)
where
    I: IntoIterator<Item = String>,
{
    let (debug, rest): (Vec<String>, Vec<String>) =
        args.into_iter().partition(|arg| arg.starts_with("--debug-"));
    (CrateDebugFlags::from_args(debug), rest)
}

/// Parse debug flags from the process arguments and `BRAIN_ATLAS_DEBUG`
///
/// Returns the flags and the arguments left for the CLI parser.
/// Environment format: comma-separated crate names, or `all`.
pub fn parse_debug_flags() -> (CrateDebugFlags, Vec<String>) {
    let (mut flags, rest) = split_debug_args(env::args());
    if let Ok(env_var) = env::var("BRAIN_ATLAS_DEBUG") {
        flags.merge_list(&env_var);
    }
    (flags, rest)
}

/// Help text for debug flags
pub fn debug_flags_help() -> String {
    format!(
        r#"Debug Flags:
  --debug-all                    Enable debug logging for all crates
  --debug-{{crate-name}}          Enable debug logging for a specific crate

Available crates:
  {}

Environment Variable:
  BRAIN_ATLAS_DEBUG={{crate-name}}[,{{crate-name}}]
  BRAIN_ATLAS_DEBUG=all
"#,
        KNOWN_CRATES.join(", ")
    )
}

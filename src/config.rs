//! Benchmark configuration.
//!
//! Settings are loaded from an optional `resize-bench.toml`. Stock defaults
//! are the base layer; the file only needs the keys it wants to override.
//! Command-line flags are applied last, in `main`.
//!
//! ## Config File Location
//!
//! By default the file is looked up in the corpus directory:
//!
//! ```text
//! photos/
//! ├── resize-bench.toml   # optional
//! ├── IMG_0001.JPG
//! └── IMG_0002.jpg
//! ```
//!
//! Pass `--config path/to/file.toml` to use a file elsewhere. An explicit
//! path must exist; the implicit one may be absent.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [corpus]
//! max_files = 10                # Only the first N matching files are used
//! extensions = ["jpg", "jpeg"]  # Case-insensitive
//!
//! [thumbnail]
//! max_edge = 150                # Longest edge of the thumbnail, in pixels
//! quality = 75                  # JPEG quality for encoded thumbnails (1-100)
//!
//! [runner]
//! timeout_secs = 0              # Per-file limit; 0 waits forever
//! verbose = true                # Print a line per processed file
//! parallel_strategies = false   # Run strategies concurrently
//! # output_dir = "thumbs"       # Default: next to each source image
//!
//! [strategies]
//! only = []                     # Empty = every available strategy
//! disabled = []
//!
//! [processing]
//! # max_processes = 4           # Worker cap for parallel_strategies (default: all cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// File name looked up in the corpus directory.
pub const CONFIG_FILENAME: &str = "resize-bench.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Top-level benchmark configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BenchConfig {
    /// Which files make up the corpus.
    pub corpus: CorpusConfig,
    /// Thumbnail geometry and encoding.
    pub thumbnail: ThumbnailConfig,
    /// How strategies are invoked.
    pub runner: RunnerConfig,
    /// Strategy selection.
    pub strategies: StrategiesConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl BenchConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.corpus.max_files == 0 {
            return Err(ConfigError::Validation(
                "corpus.max_files must be at least 1".into(),
            ));
        }
        if self.corpus.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "corpus.extensions must not be empty".into(),
            ));
        }
        if self.thumbnail.max_edge == 0 {
            return Err(ConfigError::Validation(
                "thumbnail.max_edge must be non-zero".into(),
            ));
        }
        if !(1..=100).contains(&self.thumbnail.quality) {
            return Err(ConfigError::Validation(
                "thumbnail.quality must be 1-100".into(),
            ));
        }
        Ok(())
    }
}

/// Corpus selection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorpusConfig {
    /// Upper bound on the number of files benchmarked per run.
    pub max_files: usize,
    /// Accepted file extensions, compared case-insensitively.
    pub extensions: Vec<String>,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            max_files: 10,
            extensions: vec!["jpg".to_string(), "jpeg".to_string()],
        }
    }
}

/// Thumbnail geometry and encoding settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailConfig {
    /// Longest edge of the generated thumbnail. Smaller sources are not upscaled.
    pub max_edge: u32,
    /// JPEG quality (1 = worst, 100 = best).
    pub quality: u8,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            max_edge: 150,
            quality: 75,
        }
    }
}

/// Runner settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerConfig {
    /// Hard limit per file, in seconds. 0 disables the limit.
    pub timeout_secs: u64,
    /// Print a progress line for every processed file.
    pub verbose: bool,
    /// Run independent strategies concurrently.
    pub parallel_strategies: bool,
    /// Directory for thumbnails. When absent they are written next to the sources.
    pub output_dir: Option<PathBuf>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 0,
            verbose: true,
            parallel_strategies: false,
            output_dir: None,
        }
    }
}

impl RunnerConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// Strategy selection by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StrategiesConfig {
    /// When non-empty, only these strategies are considered.
    pub only: Vec<String>,
    /// Strategies that are never considered.
    pub disabled: Vec<String>,
}

impl StrategiesConfig {
    /// Whether a strategy name passes the `only`/`disabled` filters.
    /// Names compare case-insensitively.
    pub fn allows(&self, name: &str) -> bool {
        let listed = |list: &[String]| list.iter().any(|n| n.eq_ignore_ascii_case(name));
        (self.only.is_empty() || listed(&self.only)) && !listed(&self.disabled)
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of strategies run at once when `parallel_strategies` is on.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(BenchConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

fn read_toml(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<BenchConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: BenchConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load an explicitly named config file. The file must exist.
pub fn load_config_file(path: &Path) -> Result<BenchConfig, ConfigError> {
    resolve_config(Some(read_toml(path)?))
}

/// Load `resize-bench.toml` from `dir`, falling back to defaults when absent.
pub fn load_config(dir: &Path) -> Result<BenchConfig, ConfigError> {
    let path = dir.join(CONFIG_FILENAME);
    if !path.exists() {
        return resolve_config(None);
    }
    load_config_file(&path)
}

/// Returns a fully-commented stock `resize-bench.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# resize-bench configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file in the image directory as resize-bench.toml, or pass
# --config <path>. Command-line flags override values set here.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Corpus
# ---------------------------------------------------------------------------
[corpus]
# Only the first N matching files (sorted by name) are benchmarked.
max_files = 10

# File extensions to pick up, compared case-insensitively.
extensions = ["jpg", "jpeg"]

# ---------------------------------------------------------------------------
# Thumbnail
# ---------------------------------------------------------------------------
[thumbnail]
# Longest edge of the thumbnail in pixels. Smaller images are not upscaled.
max_edge = 150

# JPEG quality for encoded thumbnails (1 = worst, 100 = best).
quality = 75

# ---------------------------------------------------------------------------
# Runner
# ---------------------------------------------------------------------------
[runner]
# Per-file time limit in seconds. A strategy that exceeds it is recorded as
# a failed attempt and the run moves on. 0 waits forever.
timeout_secs = 0

# Print one line per processed file.
verbose = true

# Run strategies concurrently. Files within one strategy stay sequential.
# Timings become noisier because strategies compete for CPU.
parallel_strategies = false

# Write thumbnails here instead of next to the source images.
# output_dir = "thumbs"

# ---------------------------------------------------------------------------
# Strategy selection
# ---------------------------------------------------------------------------
[strategies]
# Run only these strategies (empty = all available).
only = []

# Never run these strategies.
disabled = []

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum strategies run at once when parallel_strategies is on.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

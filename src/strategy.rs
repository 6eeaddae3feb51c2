//! The contract every resize strategy satisfies.
//!
//! A [`Strategy`] turns one source image into one thumbnail on disk and
//! reports how large both files are. Native strategies decode and encode
//! in-process with pure Rust crates; the rest shell out to external tools.
//! The harness never looks inside a strategy: it only calls [`Strategy::invoke`]
//! and reads the [`SizePair`] or [`StrategyError`] that comes back.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
    #[error("Failed to encode: {0}")]
    Encode(String),
    #[error("{program} is not installed or not on PATH")]
    ToolMissing { program: String },
    #[error("{program} exited with {status}: {stderr}")]
    ToolFailed {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("Timed out after {0:?}")]
    TimedOut(Duration),
    #[error("Strategy panicked: {0}")]
    Panicked(String),
}

impl StrategyError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, StrategyError::TimedOut(_))
    }
}

/// Byte sizes reported by a successful invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizePair {
    pub output_bytes: u64,
    pub input_bytes: u64,
}

impl SizePair {
    pub fn new(output_bytes: u64, input_bytes: u64) -> Self {
        Self {
            output_bytes,
            input_bytes,
        }
    }

    /// Output size as a percentage of input size.
    ///
    /// An empty input yields 0 rather than a division by zero.
    pub fn ratio_percent(self) -> f64 {
        if self.input_bytes == 0 {
            return 0.0;
        }
        self.output_bytes as f64 / self.input_bytes as f64 * 100.0
    }
}

/// A named, interchangeable thumbnailing implementation.
///
/// Implementations must not panic or abort on ordinary failures (missing
/// tool, corrupt image, unwritable output); they return an error instead.
/// `invoke` is called repeatedly from one thread at a time per strategy and
/// must not leak per-call resources.
pub trait Strategy: Send + Sync {
    /// Identifier shown in reports and used to derive output file names.
    fn name(&self) -> &str;

    /// True when no external process or non-memory-safe library is involved.
    fn is_native(&self) -> bool;

    /// Thumbnail `source` into `output`.
    fn invoke(&self, source: &Path, output: &Path) -> Result<SizePair, StrategyError>;
}

/// Strategies are shared between the registry, the runner and the stats
/// that reference them.
pub type SharedStrategy = Arc<dyn Strategy>;

/// Size of a file on disk in bytes.
pub fn file_size(path: &Path) -> Result<u64, StrategyError> {
    Ok(std::fs::metadata(path)?.len())
}

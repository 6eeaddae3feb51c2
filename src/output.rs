//! Console output for runs and the strategy listing.
//!
//! # Output Format
//!
//! ## Run progress
//!
//! Each strategy gets a header, one line per file with an indented source
//! line, and a summary:
//!
//! ```text
//! image_lanczos3 * (3 files)
//!     File 1: re-encoded to size=4131 (2.4%) in 91.32ms. New avg=91.32ms
//!         Source: IMG_0001.jpg
//!     File 2: failed in 1.20ms (Failed to decode IMG_0002.jpg: ...). New avg=46.26ms
//!         Source: IMG_0002.jpg
//! image_lanczos3 took 138.77ms, file average 46.26ms
//! ```
//!
//! The `*` marks a pure Rust strategy. When strategies run in parallel
//! their lines interleave, so each line is prefixed with `[strategy]`
//! instead of relying on indentation.
//!
//! ## Strategy listing
//!
//! ```text
//! Strategies
//! 001 image_nearest *
//! 002 vipsthumbnail
//! ```
//!
//! # Architecture
//!
//! Every `format_*` function returns `Vec<String>` and does no I/O; the
//! `print_*` wrappers write the lines to stdout.

use crate::registry::Registry;
use crate::runner::{ArtifactResult, RunEvent};
use std::path::Path;
use std::time::Duration;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn native_marker(native: bool) -> &'static str {
    if native { " *" } else { "" }
}

/// Human duration with two decimals in the most natural unit (`91.32ms`).
pub fn format_duration(d: Duration) -> String {
    format!("{:.2?}", d)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// Run progress
// ============================================================================

/// Format a single run event as display lines.
pub fn format_run_event(event: &RunEvent) -> Vec<String> {
    match event {
        RunEvent::StrategyStarted {
            name,
            native,
            artifact_count,
        } => vec![format!(
            "{}{} ({} files)",
            name,
            native_marker(*native),
            artifact_count
        )],
        RunEvent::ArtifactFinished {
            index,
            source,
            elapsed,
            result,
            running_average,
            ..
        } => {
            let outcome = match result {
                ArtifactResult::Resized {
                    output_bytes,
                    ratio,
                    ..
                } => format!(
                    "re-encoded to size={} ({:.1}%) in {}",
                    output_bytes,
                    ratio,
                    format_duration(*elapsed)
                ),
                ArtifactResult::Failed { reason } => {
                    format!("failed in {} ({})", format_duration(*elapsed), reason)
                }
            };
            vec![
                format!(
                    "    File {}: {}. New avg={}",
                    index,
                    outcome,
                    format_duration(*running_average)
                ),
                format!("        Source: {}", file_name(source)),
            ]
        }
        RunEvent::StrategyFinished {
            name,
            total,
            average,
        } => vec![format!(
            "{} took {}, file average {}",
            name,
            format_duration(*total),
            format_duration(*average)
        )],
    }
}

/// Format a run event with every line prefixed by `[strategy]`.
///
/// Used when strategies run concurrently and their lines interleave.
/// Indentation is dropped since lines of one strategy are no longer adjacent.
pub fn format_tagged_run_event(event: &RunEvent) -> Vec<String> {
    let tag = event.strategy_name();
    format_run_event(event)
        .into_iter()
        .map(|line| format!("[{}] {}", tag, line.trim_start()))
        .collect()
}

pub fn print_run_event(event: &RunEvent, tagged: bool) {
    let lines = if tagged {
        format_tagged_run_event(event)
    } else {
        format_run_event(event)
    };
    for line in lines {
        println!("{}", line);
    }
}

// ============================================================================
// Strategy listing
// ============================================================================

pub fn format_registry(registry: &Registry) -> Vec<String> {
    if registry.is_empty() {
        return vec!["No strategies available".to_string()];
    }
    let mut lines = vec!["Strategies".to_string()];
    for (i, strategy) in registry.strategies().iter().enumerate() {
        lines.push(format!(
            "{} {}{}",
            format_index(i + 1),
            strategy.name(),
            native_marker(strategy.is_native())
        ));
    }
    lines.push(String::new());
    lines.push(format!(
        "{} available, {} pure Rust (*)",
        registry.len(),
        registry
            .strategies()
            .iter()
            .filter(|s| s.is_native())
            .count()
    ));
    lines
}

pub fn print_registry(registry: &Registry) {
    for line in format_registry(registry) {
        println!("{}", line);
    }
}

//! Running strategies over the corpus and aggregating the results.
//!
//! [`run`] drives one strategy through every corpus file in order and folds
//! each invocation into a [`RunStat`]. [`run_all`] does that for every
//! strategy in a [`Registry`], sequentially by default or across rayon
//! workers when parallel execution is enabled. Either way the returned stats
//! are in registration order, and files within one strategy are always
//! processed one after another.
//!
//! ## Accounting
//!
//! Every file counts as processed, whether the strategy succeeded or not.
//! A failure contributes a 0% size sample and the (usually short) time the
//! failed attempt took, so a broken strategy shows up as fast and
//! suspiciously small rather than vanishing from the table. `failed_count`
//! makes the difference visible.
//!
//! ## Progress
//!
//! Callers that want live output pass a [`Sender<RunEvent>`]; the runner
//! never prints. Send errors are ignored, a closed receiver only means
//! nobody is listening any more.

use crate::config::BenchConfig;
use crate::corpus::Corpus;
use crate::registry::Registry;
use crate::strategy::{SharedStrategy, SizePair, StrategyError};
use crate::supervisor::invoke_bounded;
use rayon::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Infix that marks a file as a generated thumbnail.
pub const OUTPUT_MARKER: &str = ".thumb.";

/// Where `strategy_name` writes its thumbnail of `source`.
///
/// `<file name>.thumb.<strategy>.jpg`, next to the source unless an output
/// directory is given. The same inputs always give the same path, so a
/// rerun overwrites its own earlier output and nothing else.
pub fn output_path(source: &Path, strategy_name: &str, output_dir: Option<&Path>) -> PathBuf {
    let file_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = format!("{file_name}{OUTPUT_MARKER}{}.jpg", output_key(strategy_name));
    match output_dir {
        Some(dir) => dir.join(name),
        None => source.with_file_name(name),
    }
}

/// The part of an output file name derived from a strategy name.
///
/// Anything outside `[A-Za-z0-9_-]` becomes `_`. Distinct names can share a
/// key (`my tool` and `my_tool`), so the registry refuses the second one,
/// comparing keys case-insensitively.
pub fn output_key(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

// ============================================================================
// RunStat
// ============================================================================

/// Aggregate timing and size figures for one strategy's pass over the corpus.
#[derive(Clone)]
pub struct RunStat {
    strategy: SharedStrategy,
    total_duration: Duration,
    processed_count: usize,
    failed_count: usize,
    size_ratio_sum: f64,
}

impl RunStat {
    pub fn new(strategy: SharedStrategy) -> Self {
        Self {
            strategy,
            total_duration: Duration::ZERO,
            processed_count: 0,
            failed_count: 0,
            size_ratio_sum: 0.0,
        }
    }

    /// Fold one invocation into the totals.
    pub fn record(&mut self, elapsed: Duration, result: &Result<SizePair, StrategyError>) {
        self.total_duration += elapsed;
        self.processed_count += 1;
        match result {
            Ok(sizes) => self.size_ratio_sum += sizes.ratio_percent(),
            Err(_) => self.failed_count += 1,
        }
    }

    pub fn strategy(&self) -> &SharedStrategy {
        &self.strategy
    }

    pub fn name(&self) -> &str {
        self.strategy.name()
    }

    pub fn is_native(&self) -> bool {
        self.strategy.is_native()
    }

    pub fn total_duration(&self) -> Duration {
        self.total_duration
    }

    pub fn processed_count(&self) -> usize {
        self.processed_count
    }

    pub fn failed_count(&self) -> usize {
        self.failed_count
    }

    pub fn size_ratio_sum(&self) -> f64 {
        self.size_ratio_sum
    }

    /// Zero when nothing was processed.
    pub fn average_duration(&self) -> Duration {
        if self.processed_count == 0 {
            return Duration::ZERO;
        }
        let nanos = self.total_duration.as_nanos() / self.processed_count as u128;
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }

    /// Mean output/input percentage. Zero when nothing was processed.
    pub fn average_size_ratio(&self) -> f64 {
        if self.processed_count == 0 {
            return 0.0;
        }
        self.size_ratio_sum / self.processed_count as f64
    }
}

impl fmt::Debug for RunStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunStat")
            .field("strategy", &self.name())
            .field("total_duration", &self.total_duration)
            .field("processed_count", &self.processed_count)
            .field("failed_count", &self.failed_count)
            .field("size_ratio_sum", &self.size_ratio_sum)
            .finish()
    }
}

// ============================================================================
// Options and events
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Per-invocation deadline. `None` waits as long as the strategy takes.
    pub timeout: Option<Duration>,
    /// Write thumbnails here instead of next to their sources.
    pub output_dir: Option<PathBuf>,
    /// Run different strategies concurrently on the rayon pool.
    pub parallel_strategies: bool,
}

impl RunOptions {
    pub fn from_config(config: &BenchConfig) -> Self {
        Self {
            timeout: config.runner.timeout(),
            output_dir: config.runner.output_dir.clone(),
            parallel_strategies: config.runner.parallel_strategies,
        }
    }
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactResult {
    Resized {
        output_bytes: u64,
        input_bytes: u64,
        ratio: f64,
    },
    Failed {
        reason: String,
    },
}

impl From<&Result<SizePair, StrategyError>> for ArtifactResult {
    fn from(result: &Result<SizePair, StrategyError>) -> Self {
        match result {
            Ok(sizes) => ArtifactResult::Resized {
                output_bytes: sizes.output_bytes,
                input_bytes: sizes.input_bytes,
                ratio: sizes.ratio_percent(),
            },
            Err(e) => ArtifactResult::Failed {
                reason: e.to_string(),
            },
        }
    }
}

/// Progress notifications emitted while a run is in flight.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    StrategyStarted {
        name: String,
        native: bool,
        artifact_count: usize,
    },
    ArtifactFinished {
        strategy: String,
        /// 1-based position in the corpus.
        index: usize,
        source: PathBuf,
        elapsed: Duration,
        result: ArtifactResult,
        running_average: Duration,
    },
    StrategyFinished {
        name: String,
        total: Duration,
        average: Duration,
    },
}

impl RunEvent {
    /// The strategy this event belongs to.
    pub fn strategy_name(&self) -> &str {
        match self {
            RunEvent::StrategyStarted { name, .. } | RunEvent::StrategyFinished { name, .. } => {
                name
            }
            RunEvent::ArtifactFinished { strategy, .. } => strategy,
        }
    }
}

// ============================================================================
// Running
// ============================================================================

/// Run one strategy over every file in the corpus.
///
/// Elapsed time is measured around the invocation only. With a timeout set
/// that includes handing the call to a worker thread.
pub fn run(
    strategy: &SharedStrategy,
    corpus: &Corpus,
    options: &RunOptions,
    events: Option<&Sender<RunEvent>>,
) -> RunStat {
    let name = strategy.name().to_string();
    let emit = |event: RunEvent| {
        if let Some(tx) = events {
            tx.send(event).ok();
        }
    };

    emit(RunEvent::StrategyStarted {
        name: name.clone(),
        native: strategy.is_native(),
        artifact_count: corpus.len(),
    });

    let mut stat = RunStat::new(strategy.clone());
    for (i, source) in corpus.iter().enumerate() {
        let output = output_path(source, &name, options.output_dir.as_deref());

        let start = Instant::now();
        let result = invoke_bounded(strategy, source, &output, options.timeout);
        let elapsed = start.elapsed();

        match &result {
            Ok(sizes) => debug!(
                strategy = %name,
                source = %source.display(),
                output_bytes = sizes.output_bytes,
                ?elapsed,
                "resized"
            ),
            Err(e) => warn!(strategy = %name, source = %source.display(), "{e}"),
        }

        stat.record(elapsed, &result);
        emit(RunEvent::ArtifactFinished {
            strategy: name.clone(),
            index: i + 1,
            source: source.clone(),
            elapsed,
            result: ArtifactResult::from(&result),
            running_average: stat.average_duration(),
        });
    }

    emit(RunEvent::StrategyFinished {
        name,
        total: stat.total_duration(),
        average: stat.average_duration(),
    });
    stat
}

/// Run every registered strategy and return stats in registration order.
///
/// Parallel mode uses the global rayon pool; `collect` on an indexed
/// parallel iterator keeps the input order, so the result is the same shape
/// either way. Timings measured in parallel compete for CPU and are only
/// comparable with each other.
pub fn run_all(
    registry: &Registry,
    corpus: &Corpus,
    options: &RunOptions,
    events: Option<Sender<RunEvent>>,
) -> Vec<RunStat> {
    let events = events.as_ref();
    if options.parallel_strategies {
        registry
            .strategies()
            .par_iter()
            .map(|strategy| run(strategy, corpus, options, events))
            .collect()
    } else {
        registry
            .strategies()
            .iter()
            .map(|strategy| run(strategy, corpus, options, events))
            .collect()
    }
}

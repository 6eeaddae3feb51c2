//! # Resize Bench
//!
//! A comparison harness for image thumbnailing strategies. It finds out which
//! strategies are usable on this machine, runs each one over the same small
//! set of JPEGs, and ranks them by average time per file, alongside how large
//! the thumbnails came out relative to their sources.
//!
//! # Architecture: Register, Run, Rank
//!
//! ```text
//! 1. Register  candidates  →  Registry       (probe each, keep the usable ones)
//! 2. Run       Registry × Corpus → RunStat  (one per strategy, in order)
//! 3. Rank      Vec<RunStat> → report         (stable sort, table or JSON)
//! ```
//!
//! Each phase finishes before the next starts. The registry is frozen before
//! anything runs, and the report only sees stats once every strategy has
//! been through the whole corpus.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`strategy`] | The `Strategy` trait, `SizePair` and `StrategyError` |
//! | [`probe`] | Startup checks: is this executable on `PATH`? |
//! | [`registry`] | Candidates, the registry builder and the frozen `Registry` |
//! | [`strategies`] | Concrete strategies and the composition root that registers them |
//! | [`corpus`] | Picks the input files: sorted, filtered, capped |
//! | [`runner`] | Runs strategies over the corpus, aggregates `RunStat`s, emits progress |
//! | [`supervisor`] | Per-invocation timeout and panic containment |
//! | [`report`] | Ranking and rendering of the final table |
//! | [`output`] | Console formatting of progress events and the strategy list |
//! | [`config`] | `resize-bench.toml` loading, merging and validation |
//! | [`logging`] | `tracing` subscriber setup |
//!
//! # Design Decisions
//!
//! ## Explicit Composition Root
//!
//! Strategy modules never register themselves. They expose
//! [`registry::Candidate`]s, and [`strategies::build_registry`] offers them to
//! a builder in a fixed order. Registration order is therefore visible in one
//! place, and it is also the tie-break order of the ranking.
//!
//! ## Failures Are Samples
//!
//! A strategy that fails on a file still gets that file counted, with a 0%
//! size ratio and whatever time the failed attempt took. A broken strategy
//! stays in the table instead of disappearing, and the `failed` column says
//! why its numbers look too good.
//!
//! ## Bounded Waits
//!
//! External tools are killed when they exceed `runner.timeout_secs`. The
//! same deadline also bounds in-process strategies through [`supervisor`],
//! so one pathological file cannot freeze the benchmark. Timeouts are a
//! distinct error and are counted like any other failure.
//!
//! ## Deterministic Outputs
//!
//! Thumbnails are written to `<file>.thumb.<strategy>.jpg`. Reruns overwrite
//! their own outputs, strategies never collide, and the corpus scanner skips
//! anything with the `.thumb.` marker so old outputs never become inputs.

pub mod config;
pub mod corpus;
pub mod logging;
pub mod output;
pub mod probe;
pub mod registry;
pub mod report;
pub mod runner;
pub mod strategies;
pub mod strategy;
pub mod supervisor;

#[cfg(test)]
pub(crate) mod test_helpers;

//! Ranking run results and rendering the comparison table.
//!
//! [`rank`] orders stats by ascending average duration with a stable sort,
//! so strategies that tie keep their registration order. [`rows`] flattens
//! ranked stats into plain [`ReportRow`]s, which render either as a
//! fixed-column text table or as JSON. [`write_report`] is the only function
//! that writes the ranked table anywhere.
//!
//! ```text
//!  #  strategy                   avg time (s)  avg size (%)  failed  pure
//!  1  image_thumbnail                   0.012         2.411       0  *
//!  2  vipsthumbnail                     0.031         2.873       0
//!  3  image_lanczos3                    0.094         2.690       0  *
//! ```

use crate::runner::RunStat;
use serde::Serialize;
use std::io::Write;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// How the ranked table is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Table,
    Json,
}

/// Order stats fastest first. Equal averages keep their input order.
pub fn rank(mut stats: Vec<RunStat>) -> Vec<RunStat> {
    stats.sort_by_key(RunStat::average_duration);
    stats
}

/// One line of the final report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub rank: usize,
    pub name: String,
    pub average_secs: f64,
    pub average_ratio: f64,
    pub processed: usize,
    pub failed: usize,
    pub native: bool,
}

/// Rows for already-ranked stats, numbered from 1.
pub fn rows(ranked: &[RunStat]) -> Vec<ReportRow> {
    ranked
        .iter()
        .enumerate()
        .map(|(i, stat)| ReportRow {
            rank: i + 1,
            name: stat.name().to_string(),
            average_secs: stat.average_duration().as_secs_f64(),
            average_ratio: stat.average_size_ratio(),
            processed: stat.processed_count(),
            failed: stat.failed_count(),
            native: stat.is_native(),
        })
        .collect()
}

pub fn format_table(rows: &[ReportRow]) -> Vec<String> {
    let width = rows
        .iter()
        .map(|r| r.name.len())
        .chain(std::iter::once("strategy".len()))
        .max()
        .unwrap_or(0);

    let mut lines = vec![format!(
        "{:>3}  {:<width$}  {:>12}  {:>12}  {:>6}  pure",
        "#", "strategy", "avg time (s)", "avg size (%)", "failed"
    )];
    for row in rows {
        let line = format!(
            "{:>3}  {:<width$}  {:>12.3}  {:>12.3}  {:>6}  {}",
            row.rank,
            row.name,
            row.average_secs,
            row.average_ratio,
            row.failed,
            if row.native { "*" } else { "" }
        );
        lines.push(line.trim_end().to_string());
    }
    lines
}

pub fn format_json(rows: &[ReportRow]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(rows)
}

/// Rank `stats` and write the report to `sink`.
pub fn write_report(
    sink: &mut impl Write,
    stats: Vec<RunStat>,
    format: ReportFormat,
) -> Result<(), ReportError> {
    let rows = rows(&rank(stats));
    match format {
        ReportFormat::Table => {
            for line in format_table(&rows) {
                writeln!(sink, "{line}")?;
            }
        }
        ReportFormat::Json => writeln!(sink, "{}", format_json(&rows)?)?,
    }
    sink.flush()?;
    Ok(())
}

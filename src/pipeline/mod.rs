//! Orchestrates one fetch → normalize → persist run.

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use tokio::time::sleep;
use tracing::{error, info};

use crate::export;
use crate::fetch::TransactionSource;
use crate::models::TransactionRecord;
use crate::normalize::normalize;
use crate::sheets::{SheetStore, SheetsWriter, UpdateSummary};

/// Pause between days during a historical backfill, out of courtesy to the
/// upstream API.
const BACKFILL_PAUSE: Duration = Duration::from_secs(1);

/// The daily batch job. Strictly sequential: the fetch completes before
/// normalization begins, and normalization before the sink write. Nothing
/// here coordinates overlapping invocations; two simultaneous runs could
/// both read the same existing-id set and double-append. Scheduling is
/// expected to keep runs apart.
pub struct Pipeline<F: TransactionSource, S: SheetStore> {
    source: F,
    writer: Option<SheetsWriter<S>>,
    data_dir: PathBuf
}

/// What one run produced; the caller renders this into the user-facing
/// summary.
#[derive(Debug)]
pub struct RunReport {
    pub date: NaiveDate,
    pub records: Vec<TransactionRecord>,
    pub csv_path: Option<PathBuf>,
    pub sheet_summary: Option<UpdateSummary>
}

impl RunReport {
    /// Per-type counts, most frequent first.
    pub fn type_counts(&self) -> Vec<(String, usize)> {
        counts(self.records.iter().map(|record| record.transaction_type.as_str()))
    }

    /// Per-team counts, most frequent first.
    pub fn team_counts(&self) -> Vec<(String, usize)> {
        counts(self.records.iter().map(|record| record.team.as_str()))
    }
}

fn counts<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut tally: HashMap<&str, usize> = HashMap::new();

    for label in labels {
        *tally.entry(label).or_default() += 1;
    }

    let mut counts: Vec<(String, usize)> = tally
        .into_iter()
        .map(|(label, count)| (label.to_string(), count))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

impl<F: TransactionSource, S: SheetStore> Pipeline<F, S> {
    /// A `None` writer runs the pipeline in CSV-only mode.
    pub fn new(source: F, writer: Option<SheetsWriter<S>>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            source,
            writer,
            data_dir: data_dir.into()
        }
    }

    /// Runs the daily pipeline for `date`, defaulting to today (UTC).
    ///
    /// A fetch failure or a sink append failure aborts the run before any
    /// destination mutation. An empty day is a success with nothing written.
    pub async fn run(&self, date: Option<NaiveDate>) -> Result<RunReport> {
        let target = date.unwrap_or_else(|| Utc::now().date_naive());
        info!("starting daily transaction run for {target}");

        let payload = self.source.fetch(Some(target)).await?;
        let records = normalize(&payload);

        if records.is_empty() {
            info!("no transactions found for {target}");
            return Ok(RunReport {
                date: target,
                records,
                csv_path: None,
                sheet_summary: None
            });
        }

        let csv_path = self.data_dir.join(format!("nfl_transactions_{target}.csv"));
        export::save_to_csv(&records, &csv_path)
            .with_context(|| format!("could not write backup csv {}", csv_path.display()))?;

        let sheet_summary = match &self.writer {
            Some(writer) => Some(writer.process_daily_update(&records).await?),
            None => {
                info!("destination sheet not configured, csv backup only");
                None
            }
        };

        info!("daily run for {target} complete");

        Ok(RunReport {
            date: target,
            records,
            csv_path: Some(csv_path),
            sheet_summary
        })
    }

    /// Re-runs the daily pipeline for every date in the inclusive range.
    ///
    /// A failed day is logged and skipped so one bad date cannot sink the
    /// whole backfill. Returns the total number of records found.
    pub async fn backfill(&self, start: NaiveDate, end: NaiveDate) -> Result<usize> {
        anyhow::ensure!(start <= end, "backfill start {start} is after end {end}");
        info!("starting historical backfill from {start} to {end}");

        let mut total = 0;
        let mut current = start;

        loop {
            match self.run(Some(current)).await {
                Ok(report) => total += report.records.len(),
                Err(error) => error!("backfill failed for {current}: {error:#}")
            }

            if current == end {
                break;
            }

            current = current.succ_opt().context("backfill date overflow")?;
            sleep(BACKFILL_PAUSE).await;
        }

        info!("historical backfill complete, {total} transactions found");
        Ok(total)
    }
}

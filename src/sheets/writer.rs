use std::collections::HashSet;

use chrono::Utc;
use tracing::{info, warn};

use crate::models::{SinkError, TransactionRecord};
use crate::sheets::SheetStore;

/// Default worksheet receiving transaction rows.
pub const TRANSACTIONS_WORKSHEET: &str = "NFL_Transactions";

/// Header row; cell order must match `TransactionRecord::to_row`.
pub const SHEET_HEADER: [&str; 7] = [
    "Date",
    "Type",
    "Team",
    "Player",
    "Description",
    "Transaction ID",
    "Scraped At"
];

const METADATA_WORKSHEET: &str = "Metadata";
const METADATA_HEADER: [&str; 2] = ["Field", "Value"];

/// 1-based position of the Transaction ID column (column F).
const TRANSACTION_ID_COLUMN: usize = 6;

/// Outcome of one sink write, the run's reported result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateSummary {
    pub total: usize,
    pub new: usize,
    pub duplicate: usize
}

/// Appends normalized records to the destination store, skipping every
/// transaction id the store already holds.
pub struct SheetsWriter<S: SheetStore> {
    store: S,
    worksheet: String
}

impl<S: SheetStore> SheetsWriter<S> {
    pub fn new(store: S, worksheet: impl Into<String>) -> Self {
        Self {
            store,
            worksheet: worksheet.into()
        }
    }

    /// Runs the full daily update: worksheet setup, duplicate filtering,
    /// one batch append, metadata rewrite.
    ///
    /// # Errors
    /// Returns `SinkError` if worksheet setup or the append fails. A failed
    /// read of the existing id column is downgraded to "no existing ids"
    /// (fail-open), and a failed metadata rewrite is logged only.
    pub async fn process_daily_update(
        &self,
        records: &[TransactionRecord]
    ) -> Result<UpdateSummary, SinkError> {
        self.store.ensure_sheet(&self.worksheet, &SHEET_HEADER).await?;

        let existing = self.existing_ids().await;
        let new_records: Vec<&TransactionRecord> = records
            .iter()
            .filter(|record| !existing.contains(&record.transaction_id))
            .collect();

        let summary = UpdateSummary {
            total: records.len(),
            new: new_records.len(),
            duplicate: records.len() - new_records.len()
        };

        if new_records.is_empty() {
            info!("no new transactions to append");
        } else {
            let rows = new_records.iter().map(|record| record.to_row()).collect();
            self.store.append_rows(&self.worksheet, rows).await?;
            info!("appended {} new transactions to {}", summary.new, self.worksheet);
        }

        if let Err(error) = self.update_metadata().await {
            warn!("metadata update failed, continuing: {error}");
        }

        Ok(summary)
    }

    /// Fail-open: an unreadable id column must not block the run, at the
    /// cost of possibly re-appending rows the sheet already holds.
    async fn existing_ids(&self) -> HashSet<String> {
        match self.store.column_values(&self.worksheet, TRANSACTION_ID_COLUMN).await {
            Ok(values) => {
                info!("found {} existing transactions", values.len());
                values.into_iter().collect()
            }
            Err(error) => {
                warn!("could not read existing transaction ids, assuming none: {error}");
                HashSet::new()
            }
        }
    }

    async fn update_metadata(&self) -> Result<(), SinkError> {
        self.store.ensure_sheet(METADATA_WORKSHEET, &METADATA_HEADER).await?;

        let updated = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let rows = vec![
            row(&METADATA_HEADER),
            row(&["Last Updated", &updated]),
            row(&["Data Source", "ESPN NFL Transactions API"]),
            row(&["Automation", "GitHub Actions"]),
            row(&["Status", "Active"])
        ];

        self.store.replace_rows(METADATA_WORKSHEET, rows).await
    }
}

fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|cell| cell.to_string()).collect()
}

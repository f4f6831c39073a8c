//! Destination store: a spreadsheet receiving append-only transaction rows
//! plus a small rewritable metadata worksheet.

mod client;
mod writer;

use async_trait::async_trait;

use crate::models::SinkError;

pub use client::GoogleSheetsClient;
pub use writer::{SheetsWriter, UpdateSummary, SHEET_HEADER, TRANSACTIONS_WORKSHEET};

/// Row-oriented view of the destination spreadsheet.
///
/// Production uses [`GoogleSheetsClient`]; tests supply in-memory stores.
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Creates the named worksheet with a header row if it does not exist.
    async fn ensure_sheet(&self, title: &str, header: &[&str]) -> Result<(), SinkError>;

    /// Returns all non-empty values of a 1-based column, header excluded.
    async fn column_values(&self, title: &str, column: usize) -> Result<Vec<String>, SinkError>;

    /// Appends rows after the last populated row, as one batch.
    async fn append_rows(&self, title: &str, rows: Vec<Vec<String>>) -> Result<(), SinkError>;

    /// Clears the worksheet and rewrites it with the given rows.
    async fn replace_rows(&self, title: &str, rows: Vec<Vec<String>>) -> Result<(), SinkError>;
}

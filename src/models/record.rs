use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sentinel written in place of any absent or empty source field.
pub const UNKNOWN: &str = "Unknown";

/// A single normalized NFL transaction.
///
/// Built fresh from the API response on every run and immutable after
/// normalization. `transaction_id` is the sole deduplication key, both
/// within a batch and against rows already in the destination sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    /// Calendar date the transaction was recorded, canonical `YYYY-MM-DD`.
    pub date: NaiveDate,
    /// Transaction category label as reported by the source.
    #[serde(rename = "type")]
    pub transaction_type: String,
    pub team: String,
    pub player: String,
    pub description: String,
    /// Source-provided unique identifier, assumed stable per transaction.
    pub transaction_id: String,
    /// When this run ingested the record, not the transaction's own date.
    pub scraped_at: DateTime<Utc>
}

impl TransactionRecord {
    /// Cell order matches the destination sheet header
    /// `[Date, Type, Team, Player, Description, Transaction ID, Scraped At]`.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.date.to_string(),
            self.transaction_type.clone(),
            self.team.clone(),
            self.player.clone(),
            self.description.clone(),
            self.transaction_id.clone(),
            self.scraped_at.to_rfc3339()
        ]
    }
}

/// Decoded upstream response. Items are kept untyped so that one malformed
/// entry cannot fail decoding of the whole payload; the normalizer handles
/// them individually.
#[derive(Debug, Default, Deserialize)]
pub struct RawPayload {
    #[serde(default)]
    pub items: Vec<Value>
}

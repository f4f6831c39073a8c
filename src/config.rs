//! Environment-driven configuration, read once at startup.

use std::env;
use std::path::PathBuf;

use tracing::warn;

use crate::sheets::TRANSACTIONS_WORKSHEET;

/// Destination spreadsheet settings; absent when the run is CSV-only.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    pub token: String,
    pub worksheet: String
}

#[derive(Debug, Clone)]
pub struct Config {
    pub sheets: Option<SheetsConfig>,
    pub data_dir: PathBuf
}

impl Config {
    /// Reads configuration from the environment. Missing sheet credentials
    /// degrade the run to CSV-only rather than failing it.
    pub fn from_env() -> Self {
        let sheets = match (non_empty("GOOGLE_SHEET_ID"), non_empty("GOOGLE_SHEETS_TOKEN")) {
            (Some(spreadsheet_id), Some(token)) => Some(SheetsConfig {
                spreadsheet_id,
                token,
                worksheet: non_empty("NFL_WORKSHEET")
                    .unwrap_or_else(|| TRANSACTIONS_WORKSHEET.to_string())
            }),
            _ => {
                warn!("GOOGLE_SHEET_ID / GOOGLE_SHEETS_TOKEN not set, sheet updates disabled");
                None
            }
        };

        Self {
            sheets,
            data_dir: non_empty("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data"))
        }
    }
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

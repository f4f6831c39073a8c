//! CSV backup of each run's normalized batch.


use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::models::TransactionRecord;

/// Writes the batch to `path`, creating parent directories as needed.
/// Column order mirrors the destination sheet.
pub fn save_to_csv(records: &[TransactionRecord], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("could not create {}", parent.display()))?;
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("could not open {}", path.display()))?;

    for record in records {
        writer.serialize(record)?;
    }

    writer.flush()?;
    info!("saved {} transactions to {}", records.len(), path.display());

    Ok(())
}

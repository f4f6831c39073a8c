use super::Pipeline;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};
use tempfile::tempdir;

use crate::fetch::TransactionSource;
use crate::models::{FetchError, RawPayload};
use crate::sheets::tests::MemorySheetStore;
use crate::sheets::{SheetsWriter, TRANSACTIONS_WORKSHEET};

/// Serves the same canned items for every requested date.
struct StubSource {
    items: Vec<Value>
}

#[async_trait]
impl TransactionSource for StubSource {
    async fn fetch(&self, _date: Option<NaiveDate>) -> Result<RawPayload, FetchError> {
        Ok(RawPayload {
            items: self.items.clone()
        })
    }
}

/// Serves canned items except on one date, where the upstream is down.
struct FlakySource {
    items: Vec<Value>,
    failing_date: NaiveDate
}

#[async_trait]
impl TransactionSource for FlakySource {
    async fn fetch(&self, date: Option<NaiveDate>) -> Result<RawPayload, FetchError> {
        if date == Some(self.failing_date) {
            return Err(exhausted_fetch(self.failing_date));
        }

        Ok(RawPayload {
            items: self.items.clone()
        })
    }
}

fn exhausted_fetch(date: NaiveDate) -> FetchError {
    // A URL without a host cannot build a request, which yields the only
    // kind of client error constructible without a network.
    let source = reqwest::Client::new()
        .get("http://")
        .build()
        .expect_err("hostless url must fail");

    FetchError::RetriesExhausted {
        date,
        attempts: 3,
        source
    }
}

fn item(id: &str, date: &str) -> Value {
    json!({
        "id": id,
        "date": date,
        "type": {"displayName": "Signing"},
        "team": {"displayName": "Philadelphia Eagles"},
        "player": {"displayName": "Test Player"},
        "description": "Test transaction"
    })
}

fn date(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| anyhow!("bad date"))
}

#[tokio::test]
async fn test_run_without_sheet_writer_is_csv_only() -> Result<()> {
    let dir = tempdir()?;
    let source = StubSource {
        items: vec![item("a", "2024-01-15T14:30:00Z"), item("b", "2024-01-16T14:30:00Z")]
    };
    let pipeline = Pipeline::new(source, None::<SheetsWriter<MemorySheetStore>>, dir.path());

    let report = pipeline.run(Some(date(2024, 1, 16)?)).await?;

    assert_eq!(report.records.len(), 2);
    assert!(report.sheet_summary.is_none());

    let csv_path = report.csv_path.ok_or_else(|| anyhow!("csv path missing"))?;
    assert!(csv_path.exists());
    assert!(csv_path.ends_with("nfl_transactions_2024-01-16.csv"));

    Ok(())
}

#[tokio::test]
async fn test_run_filters_ids_already_in_the_sheet() -> Result<()> {
    // Payload carries a duplicated id, a record the sheet already holds,
    // and an unparseable date. Normalization keeps the first "a" and dates
    // "b" with the processing date; the sink appends only "b".
    let dir = tempdir()?;
    let store = MemorySheetStore::new();
    let source = StubSource {
        items: vec![
            item("a", "2024-01-15T00:00:00Z"),
            item("a", "2024-01-16T00:00:00Z"),
            item("b", "bad-date")
        ]
    };
    let seed_pipeline = Pipeline::new(
        StubSource {
            items: vec![item("a", "2024-01-15T00:00:00Z")]
        },
        Some(SheetsWriter::new(store.clone(), TRANSACTIONS_WORKSHEET)),
        dir.path()
    );
    seed_pipeline.run(Some(date(2024, 1, 15)?)).await?;

    let pipeline = Pipeline::new(
        source,
        Some(SheetsWriter::new(store.clone(), TRANSACTIONS_WORKSHEET)),
        dir.path()
    );
    let report = pipeline.run(Some(date(2024, 1, 16)?)).await?;

    let summary = report.sheet_summary.ok_or_else(|| anyhow!("summary missing"))?;
    assert_eq!(summary.total, 2);
    assert_eq!(summary.new, 1);
    assert_eq!(summary.duplicate, 1);

    let rows = store.rows(TRANSACTIONS_WORKSHEET);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1][5], "a");
    assert_eq!(rows[2][5], "b");

    Ok(())
}

#[tokio::test]
async fn test_rerunning_the_same_day_appends_nothing() -> Result<()> {
    let dir = tempdir()?;
    let store = MemorySheetStore::new();
    let items = vec![item("a", "2024-01-15T00:00:00Z"), item("b", "2024-01-15T01:00:00Z")];

    let pipeline = Pipeline::new(
        StubSource { items },
        Some(SheetsWriter::new(store.clone(), TRANSACTIONS_WORKSHEET)),
        dir.path()
    );

    let first = pipeline.run(Some(date(2024, 1, 15)?)).await?;
    let second = pipeline.run(Some(date(2024, 1, 15)?)).await?;

    let first = first.sheet_summary.ok_or_else(|| anyhow!("first summary missing"))?;
    let second = second.sheet_summary.ok_or_else(|| anyhow!("second summary missing"))?;

    assert_eq!(first.new, 2);
    assert_eq!(second.new, 0);
    assert_eq!(second.duplicate, 2);
    assert_eq!(store.rows(TRANSACTIONS_WORKSHEET).len(), 3);

    Ok(())
}

#[tokio::test]
async fn test_empty_day_writes_nothing() -> Result<()> {
    let dir = tempdir()?;
    let pipeline = Pipeline::new(
        StubSource { items: Vec::new() },
        None::<SheetsWriter<MemorySheetStore>>,
        dir.path()
    );

    let report = pipeline.run(Some(date(2024, 1, 15)?)).await?;

    assert!(report.records.is_empty());
    assert!(report.csv_path.is_none());
    assert!(report.sheet_summary.is_none());

    Ok(())
}

#[tokio::test]
async fn test_report_breakdowns_count_and_rank_labels() -> Result<()> {
    let dir = tempdir()?;
    let items = vec![
        json!({"id": "a", "date": "2024-01-15T00:00:00Z", "type": {"displayName": "Signing"}, "team": {"displayName": "Eagles"}}),
        json!({"id": "b", "date": "2024-01-15T00:00:00Z", "type": {"displayName": "Signing"}, "team": {"displayName": "Cowboys"}}),
        json!({"id": "c", "date": "2024-01-15T00:00:00Z", "type": {"displayName": "Release"}, "team": {"displayName": "Eagles"}})
    ];
    let pipeline = Pipeline::new(
        StubSource { items },
        None::<SheetsWriter<MemorySheetStore>>,
        dir.path()
    );

    let report = pipeline.run(Some(date(2024, 1, 15)?)).await?;

    assert_eq!(
        report.type_counts(),
        vec![("Signing".to_string(), 2), ("Release".to_string(), 1)]
    );
    assert_eq!(
        report.team_counts(),
        vec![("Eagles".to_string(), 2), ("Cowboys".to_string(), 1)]
    );

    Ok(())
}

#[tokio::test]
async fn test_backfill_covers_the_range_and_dedups_across_days() -> Result<()> {
    // The stub serves the same two transactions for both days; the second
    // day finds them already in the sheet and appends nothing new.
    let dir = tempdir()?;
    let store = MemorySheetStore::new();
    let items = vec![item("a", "2024-01-15T00:00:00Z"), item("b", "2024-01-15T01:00:00Z")];

    let pipeline = Pipeline::new(
        StubSource { items },
        Some(SheetsWriter::new(store.clone(), TRANSACTIONS_WORKSHEET)),
        dir.path()
    );

    let total = pipeline.backfill(date(2024, 1, 15)?, date(2024, 1, 16)?).await?;

    assert_eq!(total, 4);
    assert_eq!(store.rows(TRANSACTIONS_WORKSHEET).len(), 3);

    Ok(())
}

#[tokio::test]
async fn test_backfill_skips_a_failed_day_and_finishes_the_range() -> Result<()> {
    // The middle day's fetch fails outright; the backfill logs it, moves
    // on, and still counts the days around it.
    let dir = tempdir()?;
    let store = MemorySheetStore::new();
    let source = FlakySource {
        items: vec![item("a", "2024-01-15T00:00:00Z"), item("b", "2024-01-15T01:00:00Z")],
        failing_date: date(2024, 1, 16)?
    };

    let pipeline = Pipeline::new(
        source,
        Some(SheetsWriter::new(store.clone(), TRANSACTIONS_WORKSHEET)),
        dir.path()
    );

    let total = pipeline.backfill(date(2024, 1, 15)?, date(2024, 1, 17)?).await?;

    assert_eq!(total, 4);
    assert_eq!(store.rows(TRANSACTIONS_WORKSHEET).len(), 3);

    Ok(())
}

#[tokio::test]
async fn test_backfill_rejects_inverted_range() -> Result<()> {
    let dir = tempdir()?;
    let pipeline = Pipeline::new(
        StubSource { items: Vec::new() },
        None::<SheetsWriter<MemorySheetStore>>,
        dir.path()
    );

    let result = pipeline.backfill(date(2024, 1, 16)?, date(2024, 1, 15)?).await;

    assert!(result.is_err());

    Ok(())
}

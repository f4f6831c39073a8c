//! Turns raw API items into clean, deduplicated, date-sorted records.


use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::models::{ParseItemError, RawPayload, TransactionRecord, UNKNOWN};

/// Typed view of one payload item. Every field is optional; the feed omits
/// or nulls fields freely.
#[derive(Debug, Deserialize)]
struct RawItem {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default, rename = "type")]
    transaction_type: Option<DisplayName>,
    #[serde(default)]
    team: Option<DisplayName>,
    #[serde(default)]
    player: Option<DisplayName>,
    #[serde(default)]
    description: Option<String>
}

#[derive(Debug, Deserialize)]
struct DisplayName {
    #[serde(default, rename = "displayName")]
    display_name: Option<String>
}

/// Normalizes a payload against the current wall clock.
pub fn normalize(payload: &RawPayload) -> Vec<TransactionRecord> {
    normalize_at(payload, Utc::now())
}

/// Normalizes a payload against an explicit processing instant.
///
/// Items are extracted in payload order; a malformed item is logged and
/// skipped, never aborting the batch. The result is deduplicated by
/// `transaction_id` (first occurrence wins) and stable-sorted ascending by
/// date, so records sharing a date keep their relative input order. An empty
/// payload yields an empty batch.
pub fn normalize_at(payload: &RawPayload, now: DateTime<Utc>) -> Vec<TransactionRecord> {
    let mut records: Vec<TransactionRecord> = Vec::with_capacity(payload.items.len());

    for (index, item) in payload.items.iter().enumerate() {
        match extract(item, now) {
            Ok(record) => records.push(record),
            Err(error) => warn!("skipping malformed item {index}: {error}")
        }
    }

    let mut seen = HashSet::new();
    records.retain(|record| seen.insert(record.transaction_id.clone()));
    records.sort_by_key(|record| record.date);

    info!("normalized {} unique transactions", records.len());
    records
}

fn extract(item: &Value, now: DateTime<Utc>) -> Result<TransactionRecord, ParseItemError> {
    let item = RawItem::deserialize(item)?;

    Ok(TransactionRecord {
        date: parse_transaction_date(item.date.as_deref(), now.date_naive()),
        transaction_type: display_name(item.transaction_type),
        team: display_name(item.team),
        player: display_name(item.player),
        description: clean(item.description),
        transaction_id: identifier(item.id),
        scraped_at: now
    })
}

/// Accepts ISO-8601 with an offset (trailing `Z` included), a bare datetime,
/// or a bare date. Anything else falls back to the processing date rather
/// than discarding the record.
fn parse_transaction_date(raw: Option<&str>, fallback: NaiveDate) -> NaiveDate {
    let Some(raw) = raw.filter(|value| !value.is_empty()) else {
        return fallback;
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.date_naive();
    }

    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return parsed.date();
    }

    if let Ok(parsed) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return parsed;
    }

    fallback
}

fn display_name(field: Option<DisplayName>) -> String {
    clean(field.and_then(|inner| inner.display_name))
}

fn clean(value: Option<String>) -> String {
    match value {
        Some(value) if !value.is_empty() => value,
        _ => UNKNOWN.to_string()
    }
}

/// Ids arrive as strings or bare numbers depending on the feed; a missing or
/// empty id becomes the sentinel like every other field.
fn identifier(id: Option<Value>) -> String {
    match id {
        Some(Value::String(id)) if !id.is_empty() => id,
        Some(Value::Number(id)) => id.to_string(),
        _ => UNKNOWN.to_string()
    }
}

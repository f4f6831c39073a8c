use chrono::NaiveDate;
use thiserror::Error;

/// The upstream transactions request could not be completed. Fatal to the
/// run; no partial data is ever used.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http client could not be constructed: {0}")]
    Client(#[from] reqwest::Error),

    #[error("transactions request for {date} failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        date: NaiveDate,
        attempts: u32,
        #[source]
        source: reqwest::Error
    }
}

/// A single payload item could not be turned into a record. Non-fatal; the
/// item is dropped and the rest of the batch proceeds.
#[derive(Debug, Error)]
pub enum ParseItemError {
    #[error("item could not be decoded: {0}")]
    Decode(#[from] serde_json::Error)
}

/// The destination store rejected or failed an operation.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sheets request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("sheets api returned {status} during {operation}")]
    Api {
        operation: String,
        status: reqwest::StatusCode
    },

    #[error("destination store error: {0}")]
    Store(String)
}

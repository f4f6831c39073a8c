//! Upstream side of the pipeline: the ESPN transactions API client.


use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::Client;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::models::{FetchError, RawPayload};

/// Fixed endpoint serving league-wide transaction listings.
pub const TRANSACTIONS_URL: &str =
    "https://sports.core.api.espn.com/v2/sports/football/leagues/nfl/transactions";

/// Page size sent with every request. The API truncates beyond this and
/// offers no pagination, so an unusually busy day (start of free agency,
/// final roster cuts) can exceed it. Known capacity limit.
pub const PAGE_LIMIT: u32 = 100;

/// Total attempts before a fetch is abandoned.
pub const MAX_ATTEMPTS: u32 = 3;

/// Delay before the first retry; doubles on each subsequent retry.
pub const BASE_RETRY_DELAY: Duration = Duration::from_secs(2);

/// The API rejects default library user agents.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Anything that can produce a day's raw transaction payload.
///
/// The production implementation is [`Fetcher`]; tests substitute canned
/// payloads behind this seam.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    async fn fetch(&self, date: Option<NaiveDate>) -> Result<RawPayload, FetchError>;
}

/// HTTP fetcher for the transactions endpoint.
///
/// Purely functional from the caller's perspective: one call performs one
/// logical fetch (with internal retries) and holds no state between calls.
pub struct Fetcher {
    client: Client,
    base_url: String,
    limit: u32,
    max_attempts: u32,
    base_delay: Duration
}

impl Fetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: TRANSACTIONS_URL.to_string(),
            limit: PAGE_LIMIT,
            max_attempts: MAX_ATTEMPTS,
            base_delay: BASE_RETRY_DELAY
        })
    }

    /// Points the fetcher at an alternate endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Overrides the retry policy.
    pub fn with_retry(mut self, max_attempts: u32, base_delay: Duration) -> Self {
        self.max_attempts = max_attempts;
        self.base_delay = base_delay;
        self
    }

    /// Fetches the transaction listing for `date`, defaulting to today (UTC).
    ///
    /// Network failures and non-success statuses are retried with a doubling
    /// delay until the attempt budget is spent, then surfaced as
    /// [`FetchError::RetriesExhausted`]. The run must fail visibly; partial
    /// data is never used.
    pub async fn fetch(&self, date: Option<NaiveDate>) -> Result<RawPayload, FetchError> {
        let date = date.unwrap_or_else(|| Utc::now().date_naive());
        let mut delay = self.base_delay;
        let mut attempt = 1;

        info!("fetching transactions for {date}");

        loop {
            match self.request(date).await {
                Ok(payload) => {
                    info!("fetched {} transactions for {date}", payload.items.len());
                    return Ok(payload);
                }
                Err(source) if attempt < self.max_attempts => {
                    warn!(
                        "attempt {attempt} of {} failed for {date}: {source}",
                        self.max_attempts
                    );
                    sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(source) => {
                    return Err(FetchError::RetriesExhausted {
                        date,
                        attempts: attempt,
                        source
                    });
                }
            }
        }
    }

    async fn request(&self, date: NaiveDate) -> Result<RawPayload, reqwest::Error> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("limit", self.limit.to_string()), ("dates", date.to_string())])
            .send()
            .await?
            .error_for_status()?;

        response.json().await
    }
}

#[async_trait]
impl TransactionSource for Fetcher {
    async fn fetch(&self, date: Option<NaiveDate>) -> Result<RawPayload, FetchError> {
        Fetcher::fetch(self, date).await
    }
}

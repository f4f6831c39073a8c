use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::config::SheetsConfig;
use crate::models::SinkError;
use crate::sheets::SheetStore;

const API_BASE: &str = "https://sheets.googleapis.com/v4";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Google Sheets REST v4 client scoped to one spreadsheet.
///
/// Constructed explicitly via [`connect`](Self::connect) and dropped at the
/// end of the run; there is no shared or global client.
pub struct GoogleSheetsClient {
    client: Client,
    base_url: String,
    spreadsheet_id: String,
    token: String
}

#[derive(Debug, Deserialize)]
struct Spreadsheet {
    #[serde(default)]
    sheets: Vec<Sheet>
}

#[derive(Debug, Deserialize)]
struct Sheet {
    properties: SheetProperties
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String
}

#[derive(Debug, Default, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>
}

impl GoogleSheetsClient {
    /// Connects to the configured spreadsheet and verifies it is reachable
    /// with the supplied token before any pipeline work starts.
    pub async fn connect(config: &SheetsConfig) -> Result<Self, SinkError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        let store = Self {
            client,
            base_url: API_BASE.to_string(),
            spreadsheet_id: config.spreadsheet_id.clone(),
            token: config.token.clone()
        };

        store.sheet_titles().await?;
        info!("connected to spreadsheet {}", store.spreadsheet_id);

        Ok(store)
    }

    async fn sheet_titles(&self) -> Result<Vec<String>, SinkError> {
        let url = format!(
            "{}/spreadsheets/{}?fields=sheets.properties.title",
            self.base_url, self.spreadsheet_id
        );
        let response = self.send(self.client.get(url), "spreadsheet lookup").await?;
        let spreadsheet: Spreadsheet = response.json().await?;

        Ok(spreadsheet
            .sheets
            .into_iter()
            .map(|sheet| sheet.properties.title)
            .collect())
    }

    async fn add_sheet(&self, title: &str) -> Result<(), SinkError> {
        let url = format!("{}/spreadsheets/{}:batchUpdate", self.base_url, self.spreadsheet_id);
        let body = json!({
            "requests": [{"addSheet": {"properties": {"title": title}}}]
        });

        self.send(self.client.post(url).json(&body), "worksheet creation").await?;
        Ok(())
    }

    fn values_url(&self, range: &str, suffix: &str) -> String {
        format!(
            "{}/spreadsheets/{}/values/{}{}",
            self.base_url, self.spreadsheet_id, range, suffix
        )
    }

    async fn send(&self, request: RequestBuilder, operation: &str) -> Result<Response, SinkError> {
        let response = request.bearer_auth(&self.token).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(SinkError::Api {
                operation: operation.to_string(),
                status
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl SheetStore for GoogleSheetsClient {
    async fn ensure_sheet(&self, title: &str, header: &[&str]) -> Result<(), SinkError> {
        if self.sheet_titles().await?.iter().any(|existing| existing == title) {
            return Ok(());
        }

        info!("creating worksheet {title}");
        self.add_sheet(title).await?;

        let header = header.iter().map(|cell| cell.to_string()).collect();
        self.append_rows(title, vec![header]).await
    }

    async fn column_values(&self, title: &str, column: usize) -> Result<Vec<String>, SinkError> {
        let letter = column_letter(column)?;
        let sheet = quote_title(title);
        let url = self.values_url(&format!("{sheet}!{letter}2:{letter}"), "");
        let response = self.send(self.client.get(url), "column read").await?;
        let range: ValueRange = response.json().await?;

        Ok(range
            .values
            .into_iter()
            .filter_map(|mut row| (!row.is_empty()).then(|| row.remove(0)))
            .filter(|value| !value.is_empty())
            .collect())
    }

    async fn append_rows(&self, title: &str, rows: Vec<Vec<String>>) -> Result<(), SinkError> {
        let url = self.values_url(
            &format!("{}!A1", quote_title(title)),
            ":append?valueInputOption=USER_ENTERED"
        );
        let body = json!({"values": rows});

        self.send(self.client.post(url).json(&body), "row append").await?;
        Ok(())
    }

    async fn replace_rows(&self, title: &str, rows: Vec<Vec<String>>) -> Result<(), SinkError> {
        let clear_url = self.values_url(&quote_title(title), ":clear");
        self.send(self.client.post(clear_url), "worksheet clear").await?;

        let update_url = self.values_url(&format!("{}!A1", quote_title(title)), "?valueInputOption=RAW");
        let body = json!({"values": rows});

        self.send(self.client.put(update_url).json(&body), "worksheet rewrite").await?;
        Ok(())
    }
}

/// A1 notation requires single quotes around titles containing spaces or
/// punctuation; quoting unconditionally is always valid. Embedded quotes
/// are doubled.
pub(crate) fn quote_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// Columns are addressed by letter; the writer only reads within the first
/// twenty-six.
fn column_letter(column: usize) -> Result<char, SinkError> {
    match column {
        1..=26 => Ok((b'A' + (column as u8 - 1)) as char),
        _ => Err(SinkError::Store(format!("column {column} out of range")))
    }
}

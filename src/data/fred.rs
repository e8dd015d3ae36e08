//! FRED API client
//!
//! Fetches the series listed under a category from the FRED
//! `category/series` endpoint, following pagination until every series of
//! the category has been collected.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::fmt;
use thiserror::Error;
use tracing::debug;

use super::{SeriesRecord, SeriesSource};

/// Base URL for the FRED API
pub const FRED_BASE_URL: &str = "https://api.stlouisfed.org/fred";

/// Largest page size the category/series endpoint accepts
const PAGE_LIMIT: u32 = 1000;

/// Errors that can occur when fetching series from FRED
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed. The request URL is stripped: it carries the API key.
    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),

    /// FRED answered with an error status
    #[error("FRED API error {code}: {message}")]
    Api { code: u16, message: String },

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Http(err.without_url())
    }
}

/// One page of the category/series response
#[derive(Debug, Deserialize)]
struct SeriesPage {
    /// Total number of series in the category
    #[serde(default)]
    count: u64,
    /// Series on this page (FRED spells the plural "seriess")
    #[serde(default)]
    seriess: Vec<ApiSeries>,
}

/// A single series entry as returned by FRED
#[derive(Debug, Deserialize)]
struct ApiSeries {
    id: String,
    title: String,
    units: String,
    #[serde(default)]
    notes: Option<String>,
}

impl From<ApiSeries> for SeriesRecord {
    fn from(series: ApiSeries) -> Self {
        SeriesRecord {
            id: series.id,
            title: series.title,
            units: series.units,
            notes: series.notes,
        }
    }
}

/// Error body FRED returns alongside non-2xx statuses
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error_code: u16,
    error_message: String,
}

/// Client for listing series by category from the FRED API
#[derive(Clone)]
pub struct FredClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl fmt::Debug for FredClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FredClient")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl FredClient {
    /// Create a new FredClient authenticated with the given API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: FRED_BASE_URL.to_string(),
        }
    }

    /// Point the client at a different FRED-compatible base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Builds the request URL for one page of a category listing
    fn page_url(&self, category_id: u32, offset: u32) -> String {
        format!(
            "{}/category/series?category_id={}&api_key={}&file_type=json&limit={}&offset={}",
            self.base_url, category_id, self.api_key, PAGE_LIMIT, offset
        )
    }

    /// Fetch every series in a category, following pagination
    ///
    /// # Returns
    /// * `Ok(Vec<SeriesRecord>)` - All series in the category, possibly empty
    /// * `Err(FetchError)` - If any page request or parse fails
    pub async fn fetch_category(&self, category_id: u32) -> Result<Vec<SeriesRecord>, FetchError> {
        let mut records = Vec::new();
        let mut offset = 0u32;

        loop {
            let page = self.fetch_page(category_id, offset).await?;
            let received = page.seriess.len();
            records.extend(page.seriess.into_iter().map(SeriesRecord::from));
            offset += received as u32;

            debug!(category_id, received, total = page.count, "fetched page");

            if !has_more(page.count, records.len(), received) {
                break;
            }
        }

        Ok(records)
    }

    /// Fetches and decodes a single page
    async fn fetch_page(&self, category_id: u32, offset: u32) -> Result<SeriesPage, FetchError> {
        let response = self
            .client
            .get(self.page_url(category_id, offset))
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(parse_error_body(status, &text));
        }

        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl SeriesSource for FredClient {
    async fn fetch_by_category(&self, category_id: u32) -> Result<Vec<SeriesRecord>, FetchError> {
        self.fetch_category(category_id).await
    }
}

/// Whether another page should be requested
fn has_more(total: u64, collected: usize, last_page_len: usize) -> bool {
    last_page_len > 0 && (collected as u64) < total
}

/// Maps an error response to `FetchError::Api`, preferring FRED's own message
fn parse_error_body(status: StatusCode, body: &str) -> FetchError {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(err) => FetchError::Api {
            code: err.error_code,
            message: err.error_message,
        },
        Err(_) => FetchError::Api {
            code: status.as_u16(),
            message: status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string(),
        },
    }
}

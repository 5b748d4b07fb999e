//! HTTP quote source
//!
//! Polls the quote server's `/query` endpoint, which answers with a JSON
//! array holding the latest top-of-book record for each stock.

use super::{FeedError, QuoteBatch, QuoteRecord, QuoteSource};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Default quote server address
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Configuration for the HTTP source
#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
    /// Server base URL, without the `/query` path
    pub base_url: String,
    /// Value of the `id` query parameter
    pub query_id: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            query_id: "1".to_string(),
            timeout: Duration::from_millis(1000),
        }
    }
}

/// Quote source backed by the quote server's HTTP API
pub struct HttpQuoteSource {
    config: HttpSourceConfig,
    client: Client,
}

impl HttpQuoteSource {
    /// Create a source with default configuration
    pub fn new() -> Result<Self, FeedError> {
        Self::with_config(HttpSourceConfig::default())
    }

    /// Create a source with custom configuration
    pub fn with_config(config: HttpSourceConfig) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FeedError::Transport(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Full query URL
    pub fn query_url(&self) -> String {
        format!("{}/query", self.config.base_url.trim_end_matches('/'))
    }

    /// Decode a response body into a batch; an empty array is no data
    pub fn decode(body: &str) -> Result<QuoteBatch, FeedError> {
        let records: Vec<QuoteRecord> = serde_json::from_str(body)?;
        if records.is_empty() {
            Ok(None)
        } else {
            Ok(Some(records))
        }
    }
}

#[async_trait]
impl QuoteSource for HttpQuoteSource {
    async fn fetch(&self) -> Result<QuoteBatch, FeedError> {
        let url = self.query_url();

        let response = self
            .client
            .get(&url)
            .query(&[("id", self.config.query_id.as_str())])
            .send()
            .await
            .map_err(|e| FeedError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::Status { status, body });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FeedError::Transport(e.to_string()))?;

        tracing::trace!(url = %url, bytes = body.len(), "Received quote response");

        Self::decode(&body)
    }
}

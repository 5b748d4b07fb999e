//! Quote feed module
//!
//! Sources that yield the latest batch of top-of-book quotes on request

mod http;
mod replay;
mod types;

pub use http::{HttpQuoteSource, HttpSourceConfig, DEFAULT_BASE_URL};
pub use replay::ReplaySource;
pub use types::{parse_timestamp, Quote, QuoteRecord};

use async_trait::async_trait;
use thiserror::Error;

/// Batch returned by a single fetch; `None` means nothing was available
pub type QuoteBatch = Option<Vec<QuoteRecord>>;

/// Quote feed errors
#[derive(Debug, Error)]
pub enum FeedError {
    /// Request could not be sent or the response body could not be read
    #[error("Transport error: {0}")]
    Transport(String),
    /// Source answered with a non-success status
    #[error("Source returned status {status}: {body}")]
    Status { status: u16, body: String },
    /// Payload did not match the quote record shape
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
    /// Local file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Fetch did not complete within the poller's deadline
    #[error("Fetch timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// Trait for quote source implementations
///
/// Each call yields the latest known batch, not a delta. Callers must not
/// assume consecutive batches are disjoint.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Fetch the next batch of quote records
    async fn fetch(&self) -> Result<QuoteBatch, FeedError>;
}

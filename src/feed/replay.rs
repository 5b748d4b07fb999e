//! Replay source for offline sessions
//!
//! Serves batches captured in a JSON file: an array of batches, each batch an
//! array of wire records.

use super::{FeedError, QuoteBatch, QuoteRecord, QuoteSource};
use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Replays a fixed sequence of batches, one per fetch
pub struct ReplaySource {
    batches: Vec<Vec<QuoteRecord>>,
    cursor: AtomicUsize,
    repeat_last: bool,
}

impl ReplaySource {
    /// Create a replay source from in-memory batches
    ///
    /// With `repeat_last` the final batch keeps being served once the
    /// sequence is exhausted, like a server that has stopped updating.
    pub fn new(batches: Vec<Vec<QuoteRecord>>, repeat_last: bool) -> Self {
        Self {
            batches,
            cursor: AtomicUsize::new(0),
            repeat_last,
        }
    }

    /// Load batches from a JSON file
    pub fn from_file(path: impl AsRef<Path>, repeat_last: bool) -> Result<Self, FeedError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let batches: Vec<Vec<QuoteRecord>> = serde_json::from_str(&content)?;

        tracing::info!(
            path = %path.as_ref().display(),
            batches = batches.len(),
            "Loaded replay batches"
        );

        Ok(Self::new(batches, repeat_last))
    }

    /// Number of batches in the sequence
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}

#[async_trait]
impl QuoteSource for ReplaySource {
    async fn fetch(&self) -> Result<QuoteBatch, FeedError> {
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed);

        let batch = match self.batches.get(idx) {
            Some(batch) => Some(batch),
            None if self.repeat_last => self.batches.last(),
            None => None,
        };

        Ok(batch.filter(|b| !b.is_empty()).cloned())
    }
}

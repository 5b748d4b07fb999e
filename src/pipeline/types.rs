//! Row types fed to the aggregation sink

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Flattened quote in the fixed sink schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationRow {
    pub stock: String,
    pub top_ask_price: f64,
    pub top_bid_price: f64,
    pub timestamp: DateTime<Utc>,
}

impl AggregationRow {
    /// Deduplication key for this row
    pub fn key(&self) -> SeenKey {
        SeenKey {
            stock: self.stock.clone(),
            timestamp: self.timestamp,
        }
    }
}

/// Identity of a logically unique quote update: (stock, timestamp)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeenKey {
    pub stock: String,
    pub timestamp: DateTime<Utc>,
}

//! Quote record to aggregation row mapping

use super::AggregationRow;
use crate::feed::QuoteRecord;

/// Converts quote records into the fixed sink row shape
///
/// An absent side maps to a price of 0, so an absent side and a quoted price
/// of 0 are indistinguishable downstream.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordMapper;

impl RecordMapper {
    pub fn new() -> Self {
        Self
    }

    /// Map a single record
    pub fn map(&self, record: &QuoteRecord) -> AggregationRow {
        AggregationRow {
            stock: record.symbol.clone(),
            top_ask_price: record.top_ask.map(|q| q.price).unwrap_or(0.0),
            top_bid_price: record.top_bid.map(|q| q.price).unwrap_or(0.0),
            timestamp: record.timestamp,
        }
    }

    /// Map a batch, preserving order
    pub fn map_batch(&self, records: &[QuoteRecord]) -> Vec<AggregationRow> {
        records.iter().map(|r| self.map(r)).collect()
    }
}

impl From<&QuoteRecord> for AggregationRow {
    fn from(record: &QuoteRecord) -> Self {
        RecordMapper.map(record)
    }
}

//! In-process aggregation table

use super::{AggregationSink, Schema, SinkError, ViewConfig};
use crate::pipeline::AggregationRow;
use std::collections::BTreeMap;

/// Per-stock aggregate over everything a [`MemorySink`] received
#[derive(Debug, Clone, PartialEq)]
pub struct StockSummary {
    pub rows: usize,
    pub avg_ask: f64,
    pub avg_bid: f64,
}

/// Sink that keeps every row in memory
///
/// Records each call it receives, so it doubles as the test fake for the
/// visualization backend.
#[derive(Debug, Default)]
pub struct MemorySink {
    schema: Option<Schema>,
    view: Option<ViewConfig>,
    rows: Vec<AggregationRow>,
    register_calls: usize,
    update_calls: usize,
    unavailable: bool,
    finished: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose backend never came up; every call fails as unavailable
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    pub fn view(&self) -> Option<&ViewConfig> {
        self.view.as_ref()
    }

    pub fn rows(&self) -> &[AggregationRow] {
        &self.rows
    }

    pub fn register_calls(&self) -> usize {
        self.register_calls
    }

    /// Number of successful `update` calls
    pub fn update_calls(&self) -> usize {
        self.update_calls
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Row count and average prices per stock
    pub fn summary(&self) -> BTreeMap<String, StockSummary> {
        let mut totals: BTreeMap<String, (usize, f64, f64)> = BTreeMap::new();
        for row in &self.rows {
            let entry = totals.entry(row.stock.clone()).or_default();
            entry.0 += 1;
            entry.1 += row.top_ask_price;
            entry.2 += row.top_bid_price;
        }

        totals
            .into_iter()
            .map(|(stock, (rows, ask, bid))| {
                let n = rows as f64;
                (
                    stock,
                    StockSummary {
                        rows,
                        avg_ask: ask / n,
                        avg_bid: bid / n,
                    },
                )
            })
            .collect()
    }

    fn check_available(&self) -> Result<(), SinkError> {
        if self.unavailable {
            return Err(SinkError::Unavailable("memory table not initialized".into()));
        }
        Ok(())
    }
}

impl AggregationSink for MemorySink {
    fn register_schema(&mut self, schema: &Schema) -> Result<(), SinkError> {
        self.register_calls += 1;
        self.check_available()?;
        if self.schema.is_some() {
            return Err(SinkError::Schema("schema already registered".into()));
        }
        self.schema = Some(schema.clone());
        Ok(())
    }

    fn configure(&mut self, view: &ViewConfig) -> Result<(), SinkError> {
        self.check_available()?;
        if self.schema.is_none() {
            return Err(SinkError::SchemaNotRegistered);
        }
        self.view = Some(view.clone());
        Ok(())
    }

    fn update(&mut self, rows: &[AggregationRow]) -> Result<(), SinkError> {
        self.check_available()?;
        if self.schema.is_none() {
            return Err(SinkError::SchemaNotRegistered);
        }
        self.rows.extend_from_slice(rows);
        self.update_calls += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.finished = true;
        Ok(())
    }
}

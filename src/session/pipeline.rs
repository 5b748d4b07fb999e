//! Per-batch glue between the poller and the sink

use crate::feed::QuoteRecord;
use crate::pipeline::{Deduplicator, RecordMapper};
use crate::sink::{AggregationSink, Schema, SinkError, ViewConfig};
use crate::telemetry::{self, CounterMetric, GaugeMetric, LatencyMetric};
use serde::Serialize;
use std::time::Instant;

/// Row-level counters for one session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    /// Batches handed to the pipeline
    pub batches: u64,
    /// Rows mapped from incoming records
    pub rows_received: u64,
    /// Rows the sink accepted
    pub rows_forwarded: u64,
    /// Rows dropped as already seen
    pub duplicates_dropped: u64,
    /// Successful sink updates
    pub updates: u64,
    /// Updates skipped because the sink was unavailable or failed
    pub updates_skipped: u64,
}

/// Map → dedup → update, owning the session's sink and seen-key set
pub struct Pipeline<S> {
    mapper: RecordMapper,
    dedup: Deduplicator,
    sink: S,
    register_attempted: bool,
    registered: bool,
    stats: PipelineStats,
}

impl<S: AggregationSink> Pipeline<S> {
    pub fn new(sink: S, dedup: Deduplicator) -> Self {
        Self {
            mapper: RecordMapper::new(),
            dedup,
            sink,
            register_attempted: false,
            registered: false,
            stats: PipelineStats::default(),
        }
    }

    /// Register the row schema and apply the view, once
    ///
    /// Returns false if the sink refused the schema. Registration is not
    /// retried; later batches are deduplicated but never sent.
    pub fn register(&mut self, schema: &Schema, view: &ViewConfig) -> bool {
        if self.register_attempted {
            return self.registered;
        }
        self.register_attempted = true;

        if let Err(e) = self.sink.register_schema(schema) {
            tracing::warn!(error = %e, "Sink rejected schema, updates will be skipped");
            return false;
        }
        self.registered = true;

        if let Err(e) = self.sink.configure(view) {
            tracing::warn!(error = %e, "Sink rejected view configuration");
        }

        tracing::info!(fields = schema.fields().len(), view = %view.view, "Registered sink schema");
        true
    }

    /// Push one polled batch through; returns the number of rows forwarded
    pub fn ingest(&mut self, records: &[QuoteRecord]) -> usize {
        let started = Instant::now();
        let rows = self.mapper.map_batch(records);
        let received = rows.len();

        let fresh = self.dedup.filter(rows);
        let dropped = received - fresh.len();

        self.stats.batches += 1;
        self.stats.rows_received += received as u64;
        self.stats.duplicates_dropped += dropped as u64;
        telemetry::increment(CounterMetric::RowsReceived, received as u64);
        telemetry::increment(CounterMetric::DuplicatesDropped, dropped as u64);
        telemetry::set_gauge(GaugeMetric::SeenKeys, self.dedup.len() as f64);

        if fresh.is_empty() {
            tracing::trace!(received, "Batch fully deduplicated");
            return 0;
        }

        if !self.registered {
            self.skip_update();
            tracing::debug!(rows = fresh.len(), "Sink not registered, skipping update");
            return 0;
        }

        let forwarded = match self.sink.update(&fresh) {
            Ok(()) => {
                self.stats.updates += 1;
                self.stats.rows_forwarded += fresh.len() as u64;
                telemetry::increment(CounterMetric::RowsForwarded, fresh.len() as u64);
                tracing::debug!(rows = fresh.len(), dropped, "Forwarded rows to sink");
                fresh.len()
            }
            Err(SinkError::Unavailable(reason)) => {
                self.skip_update();
                tracing::debug!(%reason, rows = fresh.len(), "Sink unavailable, skipping update");
                0
            }
            Err(e) => {
                self.skip_update();
                tracing::warn!(error = %e, rows = fresh.len(), "Sink update failed, skipping");
                0
            }
        };

        telemetry::record_latency(LatencyMetric::Ingest, started.elapsed());
        forwarded
    }

    fn skip_update(&mut self) {
        self.stats.updates_skipped += 1;
        telemetry::increment(CounterMetric::SinkUpdatesSkipped, 1);
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    pub fn into_parts(self) -> (S, PipelineStats) {
        (self.sink, self.stats)
    }
}

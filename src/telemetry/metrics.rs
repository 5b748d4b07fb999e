//! Prometheus metrics

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Latency metric types
#[derive(Debug, Clone, Copy)]
pub enum LatencyMetric {
    /// Quote source fetch
    Fetch,
    /// Map, dedup and sink update for one batch
    Ingest,
}

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Poll ticks issued
    Ticks,
    /// Ticks that returned records
    Batches,
    /// Ticks that returned nothing
    Misses,
    /// Ticks where the source failed
    SourceErrors,
    /// Rows mapped from incoming records
    RowsReceived,
    /// Rows handed to the sink
    RowsForwarded,
    /// Rows dropped as already seen
    DuplicatesDropped,
    /// Sink updates skipped because the sink was unavailable
    SinkUpdatesSkipped,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Keys held by the deduplicator
    SeenKeys,
}

/// Start the Prometheus scrape endpoint
pub fn install_exporter(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics exporter: {}", e))?;

    tracing::info!(%addr, "Prometheus exporter listening");
    Ok(())
}

/// Record a latency measurement
pub fn record_latency(metric: LatencyMetric, duration: Duration) {
    let metric_name = match metric {
        LatencyMetric::Fetch => "quotestream_fetch_latency_ms",
        LatencyMetric::Ingest => "quotestream_ingest_latency_ms",
    };

    histogram!(metric_name).record(duration.as_secs_f64() * 1000.0);
}

/// Increment a counter
pub fn increment(metric: CounterMetric, value: u64) {
    let metric_name = match metric {
        CounterMetric::Ticks => "quotestream_ticks_total",
        CounterMetric::Batches => "quotestream_batches_total",
        CounterMetric::Misses => "quotestream_misses_total",
        CounterMetric::SourceErrors => "quotestream_source_errors_total",
        CounterMetric::RowsReceived => "quotestream_rows_received_total",
        CounterMetric::RowsForwarded => "quotestream_rows_forwarded_total",
        CounterMetric::DuplicatesDropped => "quotestream_duplicates_dropped_total",
        CounterMetric::SinkUpdatesSkipped => "quotestream_sink_updates_skipped_total",
    };

    counter!(metric_name).increment(value);
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    let metric_name = match metric {
        GaugeMetric::SeenKeys => "quotestream_seen_keys",
    };

    gauge!(metric_name).set(value);
}

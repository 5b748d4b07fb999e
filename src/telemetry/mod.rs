//! Telemetry module
//!
//! Structured logging and Prometheus metrics

mod logging;
mod metrics;

pub use self::metrics::{
    increment, install_exporter, record_latency, set_gauge, CounterMetric, GaugeMetric,
    LatencyMetric,
};
pub use logging::{init_logging, LogFormat};

use crate::config::TelemetryConfig;

/// Marker returned once logging and metrics are installed
pub struct TelemetryGuard {
    _priv: (),
}

/// Initialize all telemetry subsystems
pub fn init_telemetry(config: &TelemetryConfig) -> anyhow::Result<TelemetryGuard> {
    init_logging(&config.log_level, config.log_format)?;

    if let Some(port) = config.metrics_port {
        install_exporter(port)?;
    }

    Ok(TelemetryGuard { _priv: () })
}

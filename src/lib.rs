//! quote-stream: Live quote polling pipeline for an aggregation view
//!
//! This library provides the core components for:
//! - Quote sources over HTTP or recorded batch files
//! - Bounded, fixed-cadence polling with cooperative stop
//! - Record mapping and at-most-once forwarding per (stock, timestamp)
//! - Aggregation sinks in memory or on Parquet
//! - Logging and Prometheus metrics

pub mod cli;
pub mod config;
pub mod feed;
pub mod pipeline;
pub mod poller;
pub mod session;
pub mod sink;
pub mod telemetry;

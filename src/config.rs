//! Configuration types for quote-stream

use crate::feed::{HttpSourceConfig, DEFAULT_BASE_URL};
use crate::poller::{PollerConfig, DEFAULT_MAX_TICKS, MAX_INTERVAL};
use crate::session::SessionConfig;
use crate::sink::ViewConfig;
use crate::telemetry::LogFormat;
use clap::ValueEnum;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub poller: PollerSettings,
    #[serde(default)]
    pub dedup: DedupConfig,
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub sink: SinkConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Where quotes come from
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Http,
    Replay,
}

/// Quote source configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,

    /// Quote server base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// `id` parameter sent with each query
    #[serde(default = "default_query_id")]
    pub query_id: String,

    /// Bound on a single fetch (milliseconds)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Batches file for the replay source
    #[serde(default)]
    pub replay_file: Option<PathBuf>,

    /// Keep serving the last replay batch once exhausted
    #[serde(default = "default_true")]
    pub repeat_last: bool,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_query_id() -> String {
    "1".to_string()
}
fn default_request_timeout_ms() -> u64 {
    1000
}
fn default_true() -> bool {
    true
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Http,
            base_url: default_base_url(),
            query_id: default_query_id(),
            request_timeout_ms: default_request_timeout_ms(),
            replay_file: None,
            repeat_last: true,
        }
    }
}

impl SourceConfig {
    pub fn http(&self) -> HttpSourceConfig {
        HttpSourceConfig {
            base_url: self.base_url.clone(),
            query_id: self.query_id.clone(),
            timeout: Duration::from_millis(self.request_timeout_ms),
        }
    }
}

/// Poll cadence configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PollerSettings {
    /// Time between ticks (milliseconds)
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Ticks before the session ends on its own
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,
}

fn default_interval_ms() -> u64 {
    200
}
fn default_max_ticks() -> u64 {
    DEFAULT_MAX_TICKS
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_ticks: default_max_ticks(),
        }
    }
}

/// Deduplication configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DedupConfig {
    /// Evict the oldest keys beyond this many; unset keeps all keys
    #[serde(default)]
    pub max_keys: Option<usize>,
}

/// Sink selection
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    #[default]
    Memory,
    Parquet,
}

/// Sink configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SinkConfig {
    #[serde(default)]
    pub kind: SinkKind,
    /// Output file for the Parquet sink
    #[serde(default)]
    pub output: Option<PathBuf>,
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default)]
    pub metrics_port: Option<u16>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            metrics_port: None,
            log_level: default_log_level(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields `None`
    ///
    /// Parse and validation errors are still returned.
    pub fn load_optional(path: impl AsRef<std::path::Path>) -> anyhow::Result<Option<Self>> {
        match Self::load(path) {
            Ok(config) => Ok(Some(config)),
            Err(e) => match e.downcast_ref::<std::io::Error>() {
                Some(io) if io.kind() == std::io::ErrorKind::NotFound => Ok(None),
                _ => Err(e),
            },
        }
    }

    /// Reject settings that would make a session meaningless
    pub fn validate(&self) -> anyhow::Result<()> {
        let max_ms = MAX_INTERVAL.as_millis() as u64;
        if self.poller.interval_ms == 0 || self.poller.interval_ms > max_ms {
            anyhow::bail!("poller.interval_ms must be between 1 and {}", max_ms);
        }
        if self.source.request_timeout_ms == 0 || self.source.request_timeout_ms > max_ms {
            anyhow::bail!("source.request_timeout_ms must be between 1 and {}", max_ms);
        }
        if self.poller.max_ticks == 0 {
            anyhow::bail!("poller.max_ticks must be at least 1");
        }
        if self.dedup.max_keys == Some(0) {
            anyhow::bail!("dedup.max_keys must be at least 1 when set");
        }
        if self.source.kind == SourceKind::Replay && self.source.replay_file.is_none() {
            anyhow::bail!("source.replay_file is required for the replay source");
        }
        if self.sink.kind == SinkKind::Parquet && self.sink.output.is_none() {
            anyhow::bail!("sink.output is required for the parquet sink");
        }
        Ok(())
    }

    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig::new(
            Duration::from_millis(self.poller.interval_ms),
            self.poller.max_ticks,
        )
        .with_fetch_timeout(Duration::from_millis(self.source.request_timeout_ms))
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            poller: self.poller_config(),
            max_seen_keys: self.dedup.max_keys,
            view: self.view.clone(),
        }
    }
}

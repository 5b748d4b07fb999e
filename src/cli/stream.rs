//! Stream command implementation

use crate::config::{Config, SinkKind, SourceKind};
use crate::feed::{HttpQuoteSource, QuoteSource, ReplaySource};
use crate::session::{SessionReport, StreamSession};
use crate::sink::{AggregationSink, MemorySink, ParquetSink};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct StreamArgs {
    /// Quote source (overrides config)
    #[arg(long, value_enum)]
    pub source: Option<SourceKind>,

    /// Quote server base URL (overrides config)
    #[arg(long)]
    pub base_url: Option<String>,

    /// JSON file of recorded batches for the replay source
    #[arg(long)]
    pub replay_file: Option<PathBuf>,

    /// Aggregation sink (overrides config)
    #[arg(long, value_enum)]
    pub sink: Option<SinkKind>,

    /// Parquet output file; selects the parquet sink unless --sink is given
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Ticks before the session ends on its own
    #[arg(long)]
    pub max_ticks: Option<u64>,

    /// Milliseconds between ticks
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Bound on the seen-key set
    #[arg(long)]
    pub max_seen_keys: Option<usize>,
}

impl StreamArgs {
    /// Layer command-line overrides on top of the loaded configuration
    pub fn apply(&self, config: &Config) -> anyhow::Result<Config> {
        let mut config = config.clone();

        if let Some(kind) = self.source {
            config.source.kind = kind;
        }
        if let Some(url) = &self.base_url {
            config.source.base_url = url.clone();
        }
        if let Some(file) = &self.replay_file {
            config.source.replay_file = Some(file.clone());
            if self.source.is_none() {
                config.source.kind = SourceKind::Replay;
            }
        }
        if let Some(output) = &self.output {
            config.sink.output = Some(output.clone());
            if self.sink.is_none() {
                config.sink.kind = SinkKind::Parquet;
            }
        }
        if let Some(kind) = self.sink {
            config.sink.kind = kind;
        }
        if let Some(max_ticks) = self.max_ticks {
            config.poller.max_ticks = max_ticks;
        }
        if let Some(interval_ms) = self.interval_ms {
            config.poller.interval_ms = interval_ms;
        }
        if let Some(max) = self.max_seen_keys {
            config.dedup.max_keys = Some(max);
        }

        config.validate()?;
        Ok(config)
    }

    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let config = self.apply(config)?;
        let source = build_source(&config)?;

        match (config.sink.kind, &config.sink.output) {
            (SinkKind::Parquet, Some(path)) => {
                let report = run_session(source, ParquetSink::new(path), &config).await?;
                println!(
                    "Session {} wrote {} rows to {}",
                    report.id,
                    report.sink.rows_written(),
                    report.sink.path().display()
                );
            }
            (SinkKind::Parquet, None) => {
                anyhow::bail!("sink.output is required for the parquet sink");
            }
            (SinkKind::Memory, _) => {
                let report = run_session(source, MemorySink::new(), &config).await?;
                print_summary(&report);
            }
        }

        Ok(())
    }
}

fn build_source(config: &Config) -> anyhow::Result<Arc<dyn QuoteSource>> {
    let source: Arc<dyn QuoteSource> = match config.source.kind {
        SourceKind::Http => {
            tracing::info!(url = %config.source.base_url, "Polling quote server");
            Arc::new(HttpQuoteSource::with_config(config.source.http())?)
        }
        SourceKind::Replay => {
            let path = config
                .source
                .replay_file
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("source.replay_file is required for the replay source"))?;
            Arc::new(ReplaySource::from_file(path, config.source.repeat_last)?)
        }
    };
    Ok(source)
}

async fn run_session<S: AggregationSink + 'static>(
    source: Arc<dyn QuoteSource>,
    sink: S,
    config: &Config,
) -> anyhow::Result<SessionReport<S>> {
    let handle = StreamSession::new(source, sink, config.session_config()).start();

    let stop = handle.stop_signal();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl-C received, stopping session");
            stop.stop();
        }
    });

    let report = handle.join().await;
    ctrl_c.abort();
    report
}

fn print_summary(report: &SessionReport<MemorySink>) {
    println!("Session {}", report.id);
    println!(
        "  Ticks: {} ({:?}), batches: {}, misses: {}, errors: {}",
        report.summary.ticks,
        report.summary.reason,
        report.summary.batches,
        report.summary.misses,
        report.summary.errors
    );
    println!(
        "  Rows: {} received, {} forwarded, {} duplicates",
        report.stats.rows_received, report.stats.rows_forwarded, report.stats.duplicates_dropped
    );

    for (stock, summary) in report.sink.summary() {
        println!(
            "  {:<8} rows={:<6} avg_ask={:.4} avg_bid={:.4}",
            stock, summary.rows, summary.avg_ask, summary.avg_bid
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_overrides() -> StreamArgs {
        StreamArgs {
            source: None,
            base_url: None,
            replay_file: None,
            sink: None,
            output: None,
            max_ticks: None,
            interval_ms: None,
            max_seen_keys: None,
        }
    }

    #[test]
    fn test_apply_without_overrides() {
        let config = no_overrides().apply(&Config::default()).unwrap();
        assert_eq!(config.source.kind, SourceKind::Http);
        assert_eq!(config.sink.kind, SinkKind::Memory);
        assert_eq!(config.poller.max_ticks, 2000);
    }

    #[test]
    fn test_output_selects_parquet_sink() {
        let args = StreamArgs {
            output: Some(PathBuf::from("rows.parquet")),
            ..no_overrides()
        };
        let config = args.apply(&Config::default()).unwrap();
        assert_eq!(config.sink.kind, SinkKind::Parquet);
        assert_eq!(config.sink.output, Some(PathBuf::from("rows.parquet")));
    }

    #[test]
    fn test_explicit_sink_wins_over_output() {
        let args = StreamArgs {
            output: Some(PathBuf::from("rows.parquet")),
            sink: Some(SinkKind::Memory),
            ..no_overrides()
        };
        let config = args.apply(&Config::default()).unwrap();
        assert_eq!(config.sink.kind, SinkKind::Memory);
    }

    #[test]
    fn test_replay_file_selects_replay_source() {
        let args = StreamArgs {
            replay_file: Some(PathBuf::from("batches.json")),
            max_ticks: Some(5),
            interval_ms: Some(10),
            ..no_overrides()
        };
        let config = args.apply(&Config::default()).unwrap();
        assert_eq!(config.source.kind, SourceKind::Replay);
        assert_eq!(config.poller.max_ticks, 5);
        assert_eq!(config.poller.interval_ms, 10);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let args = StreamArgs {
            max_ticks: Some(0),
            ..no_overrides()
        };
        assert!(args.apply(&Config::default()).is_err());

        let args = StreamArgs {
            source: Some(SourceKind::Replay),
            ..no_overrides()
        };
        assert!(args.apply(&Config::default()).is_err());
    }

    #[test]
    fn test_build_http_source() {
        assert!(build_source(&Config::default()).is_ok());
    }
}

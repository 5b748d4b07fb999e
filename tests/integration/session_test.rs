//! End-to-end session tests over recorded batches

use quote_stream::feed::ReplaySource;
use quote_stream::poller::{PollerConfig, StopReason};
use quote_stream::session::{SessionConfig, StreamSession};
use quote_stream::sink::{read_rows, MemorySink, ParquetSink};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

fn demo_batches() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/batches.json")
}

fn config(max_ticks: u64) -> SessionConfig {
    SessionConfig {
        poller: PollerConfig::new(Duration::from_millis(200), max_ticks),
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_replay_session_into_memory() {
    let source = Arc::new(ReplaySource::from_file(demo_batches(), true).unwrap());

    let report = StreamSession::new(source, MemorySink::new(), config(5))
        .start()
        .join()
        .await
        .unwrap();

    assert_eq!(report.summary.reason, StopReason::CapReached);
    assert_eq!(report.summary.ticks, 5);
    assert_eq!(report.summary.batches, 5);
    assert_eq!(report.stats.rows_received, 15);
    assert_eq!(report.stats.rows_forwarded, 6);
    assert_eq!(report.stats.duplicates_dropped, 9);
    assert_eq!(report.sink.update_calls(), 3);

    let summary = report.sink.summary();
    assert_eq!(summary["ABC"].rows, 3);
    assert_eq!(summary["DEF"].rows, 3);

    // Missing sides land as zero prices
    let def: Vec<_> = report
        .sink
        .rows()
        .iter()
        .filter(|r| r.stock == "DEF")
        .collect();
    assert_eq!(def[1].top_bid_price, 0.0);
    assert_eq!(def[2].top_ask_price, 0.0);
    assert_eq!(def[2].top_bid_price, 116.8);
}

#[tokio::test(start_paused = true)]
async fn test_replay_session_into_parquet() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sessions/rows.parquet");
    let source = Arc::new(ReplaySource::from_file(demo_batches(), false).unwrap());

    let report = StreamSession::new(source, ParquetSink::new(&path), config(10))
        .start()
        .join()
        .await
        .unwrap();

    assert_eq!(report.summary.ticks, 10);
    assert_eq!(report.summary.misses, 7);
    assert_eq!(report.sink.rows_written(), 6);

    let rows = read_rows(&path).unwrap();
    assert_eq!(rows.len(), 6);

    let keys: HashSet<_> = rows.iter().map(|r| r.key()).collect();
    assert_eq!(keys.len(), 6);
}

#[tokio::test(start_paused = true)]
async fn test_stop_from_another_task() {
    let source = Arc::new(ReplaySource::from_file(demo_batches(), true).unwrap());
    let handle = StreamSession::new(source, MemorySink::new(), SessionConfig::default()).start();

    let stop = handle.stop_signal();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(700)).await;
        stop.stop();
    });

    let report = handle.join().await.unwrap();
    assert_eq!(report.summary.reason, StopReason::Stopped);
    assert_eq!(report.summary.ticks, 3);
    assert_eq!(report.stats.rows_forwarded, 6);
}

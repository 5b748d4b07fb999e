//! Fixed-cadence polling loop

use super::{PollSummary, PollerConfig, StopReason};
use crate::feed::{FeedError, QuoteBatch, QuoteRecord, QuoteSource};
use crate::telemetry::{self, CounterMetric, LatencyMetric};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};

/// Polls a quote source on a fixed cadence for a bounded number of ticks
///
/// Each poller runs one session: `start` consumes it and hands back the
/// handle that owns the session's stop signal and tick counter.
pub struct StreamPoller {
    source: Arc<dyn QuoteSource>,
    config: PollerConfig,
}

impl StreamPoller {
    pub fn new(source: Arc<dyn QuoteSource>, config: PollerConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Start ticking; `on_batch` receives every non-empty batch
    ///
    /// The first tick fires one interval after the call. Each tick issues its
    /// own fetch on a separate task, bounded by `fetch_timeout`, so a slow or
    /// hung request never holds back later ticks. Batches reach `on_batch` one
    /// at a time on the poller task, in the order their fetches complete.
    pub fn start<F>(self, on_batch: F) -> PollerHandle
    where
        F: FnMut(Vec<QuoteRecord>) + Send + 'static,
    {
        let (stop_tx, stop_rx) = watch::channel(false);
        let ticks = Arc::new(AtomicU64::new(0));

        tracing::info!(
            interval_ms = self.config.interval.as_millis() as u64,
            max_ticks = self.config.max_ticks,
            fetch_timeout_ms = self.config.fetch_timeout.as_millis() as u64,
            max_session_secs = self.config.session_length().as_secs(),
            "Starting stream poller"
        );

        let task = tokio::spawn(run_poll_loop(
            self.source,
            self.config,
            ticks.clone(),
            stop_rx,
            on_batch,
        ));

        PollerHandle {
            stop_tx: Arc::new(stop_tx),
            ticks,
            task,
        }
    }
}

/// Cloneable trigger for [`PollerHandle::stop`]
#[derive(Clone)]
pub struct StopSignal {
    stop_tx: Arc<watch::Sender<bool>>,
}

impl StopSignal {
    pub fn stop(&self) {
        self.stop_tx.send_replace(true);
    }
}

/// Handle to a running poll loop
///
/// Dropping the handle (and every [`StopSignal`] taken from it) stops the
/// loop at its next tick.
pub struct PollerHandle {
    stop_tx: Arc<watch::Sender<bool>>,
    ticks: Arc<AtomicU64>,
    task: JoinHandle<PollSummary>,
}

impl PollerHandle {
    /// Cancel the schedule; no tick starts after this returns
    ///
    /// A fetch already in flight is abandoned and its batch is not delivered.
    pub fn stop(&self) {
        self.stop_tx.send_replace(true);
    }

    /// A stop trigger that can be moved to another task
    pub fn stop_signal(&self) -> StopSignal {
        StopSignal {
            stop_tx: self.stop_tx.clone(),
        }
    }

    /// Ticks issued so far
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the loop to end, by cap or by `stop`
    pub async fn join(self) -> anyhow::Result<PollSummary> {
        let PollerHandle { stop_tx, task, .. } = self;
        let result = task.await;
        drop(stop_tx);
        Ok(result?)
    }
}

/// Resolves once a stop was requested or the handle is gone
async fn stop_requested(stop_rx: &mut watch::Receiver<bool>) {
    let _ = stop_rx.wait_for(|stopped| *stopped).await;
}

/// Result of one tick's fetch
struct FetchOutcome {
    tick: u64,
    result: Result<QuoteBatch, FeedError>,
    elapsed: Duration,
}

fn spawn_fetch(
    source: Arc<dyn QuoteSource>,
    tick: u64,
    deadline: Duration,
    outcomes: mpsc::UnboundedSender<FetchOutcome>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let started = Instant::now();
        let result = match timeout(deadline, source.fetch()).await {
            Ok(result) => result,
            Err(_) => Err(FeedError::Timeout(deadline)),
        };

        // The receiver is gone once the loop has stopped
        let _ = outcomes.send(FetchOutcome {
            tick,
            result,
            elapsed: started.elapsed(),
        });
    })
}

async fn run_poll_loop<F>(
    source: Arc<dyn QuoteSource>,
    config: PollerConfig,
    ticks: Arc<AtomicU64>,
    mut stop_rx: watch::Receiver<bool>,
    mut on_batch: F,
) -> PollSummary
where
    F: FnMut(Vec<QuoteRecord>),
{
    let mut summary = PollSummary::new();
    let period = config.period();
    let deadline = config.fetch_deadline();
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel();
    let mut in_flight: Vec<JoinHandle<()>> = Vec::new();
    let mut pending = 0usize;

    loop {
        let capped = ticks.load(Ordering::Acquire) >= config.max_ticks;
        if capped && pending == 0 {
            summary.reason = StopReason::CapReached;
            tracing::info!(ticks = summary.ticks, "Tick cap reached, stopping poller");
            break;
        }

        tokio::select! {
            biased;
            _ = stop_requested(&mut stop_rx) => {
                for fetch in &in_flight {
                    fetch.abort();
                }
                tracing::info!(ticks = summary.ticks, abandoned = pending, "Poller stopped");
                break;
            }
            Some(outcome) = outcome_rx.recv(), if pending > 0 => {
                pending -= 1;
                deliver(&mut summary, outcome, &mut on_batch);
            }
            _ = interval.tick(), if !capped => {
                let tick = ticks.fetch_add(1, Ordering::AcqRel) + 1;
                summary.ticks = tick;
                telemetry::increment(CounterMetric::Ticks, 1);

                in_flight.retain(|fetch| !fetch.is_finished());
                in_flight.push(spawn_fetch(source.clone(), tick, deadline, outcome_tx.clone()));
                pending += 1;
            }
        }
    }

    summary
}

fn deliver<F>(summary: &mut PollSummary, outcome: FetchOutcome, on_batch: &mut F)
where
    F: FnMut(Vec<QuoteRecord>),
{
    let FetchOutcome {
        tick,
        result,
        elapsed,
    } = outcome;
    telemetry::record_latency(LatencyMetric::Fetch, elapsed);

    match result {
        Ok(Some(batch)) if !batch.is_empty() => {
            summary.batches += 1;
            telemetry::increment(CounterMetric::Batches, 1);
            tracing::trace!(tick, records = batch.len(), "Received batch");
            on_batch(batch);
        }
        Ok(_) => {
            summary.misses += 1;
            telemetry::increment(CounterMetric::Misses, 1);
            tracing::debug!(tick, "No data this tick");
        }
        Err(e) => {
            summary.errors += 1;
            telemetry::increment(CounterMetric::SourceErrors, 1);
            tracing::warn!(tick, error = %e, "Quote fetch failed, skipping tick");
        }
    }
}

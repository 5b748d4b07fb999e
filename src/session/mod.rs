//! Polling sessions
//!
//! Wires a quote source, the record pipeline and an aggregation sink into one
//! bounded session with its own poller, seen-key set and statistics.

mod pipeline;

pub use self::pipeline::{Pipeline, PipelineStats};

use crate::feed::QuoteSource;
use crate::pipeline::Deduplicator;
use crate::poller::{PollSummary, PollerConfig, PollerHandle, StopSignal, StreamPoller};
use crate::sink::{AggregationSink, Schema, ViewConfig};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Session-level settings
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub poller: PollerConfig,
    /// Bound on the seen-key set; `None` keeps every key for the session
    pub max_seen_keys: Option<usize>,
    pub view: ViewConfig,
}

/// Outcome of a finished session
#[derive(Debug)]
pub struct SessionReport<S> {
    pub id: Uuid,
    pub summary: PollSummary,
    pub stats: PipelineStats,
    pub sink: S,
}

/// A polling session that has not started yet
pub struct StreamSession<S> {
    id: Uuid,
    source: Arc<dyn QuoteSource>,
    sink: S,
    config: SessionConfig,
}

impl<S: AggregationSink + 'static> StreamSession<S> {
    pub fn new(source: Arc<dyn QuoteSource>, sink: S, config: SessionConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            sink,
            config,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Register with the sink and begin polling
    pub fn start(self) -> SessionHandle<S> {
        let span = tracing::info_span!("session", id = %self.id);

        let dedup = match self.config.max_seen_keys {
            Some(max) => Deduplicator::with_max_keys(max),
            None => Deduplicator::new(),
        };

        let mut pipeline = Pipeline::new(self.sink, dedup);
        span.in_scope(|| {
            pipeline.register(&Schema::quote_rows(), &self.config.view);
            tracing::info!(max_seen_keys = ?self.config.max_seen_keys, "Session starting");
        });

        let pipeline = Arc::new(Mutex::new(pipeline));
        let shared = pipeline.clone();
        let batch_span = span.clone();

        let poller = span.in_scope(|| {
            StreamPoller::new(self.source, self.config.poller).start(move |batch| {
                batch_span.in_scope(|| {
                    lock(&shared).ingest(&batch);
                })
            })
        });

        SessionHandle {
            id: self.id,
            span,
            poller,
            pipeline,
        }
    }
}

/// Handle to a running session
///
/// Dropping it stops polling.
pub struct SessionHandle<S> {
    id: Uuid,
    span: tracing::Span,
    poller: PollerHandle,
    pipeline: Arc<Mutex<Pipeline<S>>>,
}

impl<S: AggregationSink + 'static> SessionHandle<S> {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Stop polling before the tick cap
    pub fn stop(&self) {
        self.span.in_scope(|| tracing::info!("Stop requested"));
        self.poller.stop();
    }

    /// Stop trigger usable from another task, e.g. a signal handler
    pub fn stop_signal(&self) -> StopSignal {
        self.poller.stop_signal()
    }

    pub fn ticks(&self) -> u64 {
        self.poller.ticks()
    }

    pub fn is_finished(&self) -> bool {
        self.poller.is_finished()
    }

    /// Snapshot of the pipeline counters
    pub fn stats(&self) -> PipelineStats {
        lock(&self.pipeline).stats().clone()
    }

    /// Wait for the session to end, flush the sink and hand it back
    pub async fn join(self) -> anyhow::Result<SessionReport<S>> {
        let summary = self.poller.join().await?;

        let pipeline = Arc::try_unwrap(self.pipeline)
            .map_err(|_| anyhow::anyhow!("Pipeline still referenced after poller exit"))?
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        let (mut sink, stats) = pipeline.into_parts();

        self.span.in_scope(|| {
            if let Err(e) = sink.finish() {
                tracing::warn!(error = %e, "Failed to finish sink");
            }

            tracing::info!(
                ticks = summary.ticks,
                reason = ?summary.reason,
                rows_forwarded = stats.rows_forwarded,
                duplicates_dropped = stats.duplicates_dropped,
                "Session finished"
            );
        });

        Ok(SessionReport {
            id: self.id,
            summary,
            stats,
            sink,
        })
    }
}

fn lock<S>(pipeline: &Mutex<Pipeline<S>>) -> MutexGuard<'_, Pipeline<S>> {
    pipeline.lock().unwrap_or_else(PoisonError::into_inner)
}

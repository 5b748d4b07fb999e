//! Stream poller module
//!
//! Bounded, fixed-cadence acquisition of quote batches

mod scheduler;
mod types;

pub use scheduler::{PollerHandle, StopSignal, StreamPoller};
pub use types::{
    PollSummary, PollerConfig, StopReason, DEFAULT_FETCH_TIMEOUT, DEFAULT_INTERVAL,
    DEFAULT_MAX_TICKS, MAX_INTERVAL,
};

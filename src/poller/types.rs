//! Poller configuration and results

use serde::Serialize;
use std::time::Duration;

/// Default cadence between ticks
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(200);

/// Default number of ticks before a session ends on its own
pub const DEFAULT_MAX_TICKS: u64 = 2000;

/// Default bound on a single fetch
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_millis(1000);

/// Longest accepted interval or fetch timeout
pub const MAX_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Stream poller configuration
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Time between ticks
    pub interval: Duration,
    /// Maximum ticks per session
    pub max_ticks: u64,
    /// A fetch still pending after this long counts as a failed tick
    pub fetch_timeout: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            max_ticks: DEFAULT_MAX_TICKS,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl PollerConfig {
    pub fn new(interval: Duration, max_ticks: u64) -> Self {
        Self {
            interval,
            max_ticks,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    /// Interval clamped to `1ms..=MAX_INTERVAL`
    pub(crate) fn period(&self) -> Duration {
        self.interval.clamp(Duration::from_millis(1), MAX_INTERVAL)
    }

    /// Fetch timeout clamped to `1ms..=MAX_INTERVAL`
    pub(crate) fn fetch_deadline(&self) -> Duration {
        self.fetch_timeout.clamp(Duration::from_millis(1), MAX_INTERVAL)
    }

    /// Upper bound on how long a session runs if nothing stops it early:
    /// the last tick plus the last fetch's timeout
    pub fn session_length(&self) -> Duration {
        let ticks = u32::try_from(self.max_ticks).unwrap_or(u32::MAX);
        self.period()
            .saturating_mul(ticks)
            .saturating_add(self.fetch_deadline())
    }
}

/// Why a polling session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopReason {
    /// Tick cap reached
    CapReached,
    /// `stop()` was called or the handle was dropped
    Stopped,
}

/// Counters for one polling session
#[derive(Debug, Clone, Serialize)]
pub struct PollSummary {
    /// Ticks that issued a fetch
    pub ticks: u64,
    /// Ticks that produced a non-empty batch
    pub batches: u64,
    /// Ticks where the source had nothing
    pub misses: u64,
    /// Ticks where the source failed
    pub errors: u64,
    pub reason: StopReason,
}

impl PollSummary {
    pub(crate) fn new() -> Self {
        Self {
            ticks: 0,
            batches: 0,
            misses: 0,
            errors: 0,
            reason: StopReason::Stopped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PollerConfig::default();
        assert_eq!(config.interval, Duration::from_millis(200));
        assert_eq!(config.max_ticks, 2000);
        assert_eq!(config.fetch_timeout, Duration::from_millis(1000));
        assert_eq!(config.session_length(), Duration::from_millis(401_000));
    }

    #[test]
    fn test_session_length_saturates() {
        let config = PollerConfig::new(Duration::MAX, u64::MAX).with_fetch_timeout(Duration::MAX);
        assert_eq!(config.period(), MAX_INTERVAL);
        assert_eq!(config.fetch_deadline(), MAX_INTERVAL);
        assert_eq!(config.session_length(), MAX_INTERVAL * u32::MAX + MAX_INTERVAL);
    }

    #[test]
    fn test_new_summary() {
        let summary = PollSummary::new();
        assert_eq!(summary.ticks, 0);
        assert_eq!(summary.reason, StopReason::Stopped);
    }
}

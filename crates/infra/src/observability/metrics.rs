//! Poll-loop counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::MetricsResult;

/// Thread-safe counters for poll-loop health.
///
/// Independent counters use Acquire/Release ordering; nothing here derives
/// rates, so no stronger ordering is needed.
#[derive(Debug, Default)]
pub struct PollMetrics {
    polls: AtomicU64,
    poll_errors: AtomicU64,
    poll_timeouts: AtomicU64,
    last_poll_micros: AtomicU64,
}

impl PollMetrics {
    /// Create a zeroed metrics instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one poll invocation.
    pub fn record_poll(&self) -> MetricsResult<()> {
        self.polls.fetch_add(1, Ordering::Release);
        Ok(())
    }

    /// Record a failed poll cycle.
    pub fn record_poll_error(&self) -> MetricsResult<()> {
        self.poll_errors.fetch_add(1, Ordering::Release);
        Ok(())
    }

    /// Record a poll cycle that exceeded its budget.
    pub fn record_poll_timeout(&self) -> MetricsResult<()> {
        self.poll_timeouts.fetch_add(1, Ordering::Release);
        Ok(())
    }

    /// Record the duration of the most recent completed cycle.
    pub fn record_poll_duration(&self, duration: Duration) -> MetricsResult<()> {
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        self.last_poll_micros.store(micros, Ordering::Release);
        Ok(())
    }

    /// Total poll invocations.
    pub fn polls(&self) -> u64 {
        self.polls.load(Ordering::Acquire)
    }

    /// Total failed cycles.
    pub fn poll_errors(&self) -> u64 {
        self.poll_errors.load(Ordering::Acquire)
    }

    /// Total timed-out cycles.
    pub fn poll_timeouts(&self) -> u64 {
        self.poll_timeouts.load(Ordering::Acquire)
    }

    /// Duration of the most recent completed cycle.
    pub fn last_poll_duration(&self) -> Duration {
        Duration::from_micros(self.last_poll_micros.load(Ordering::Acquire))
    }
}

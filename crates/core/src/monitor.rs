//! Per-cycle poll pipeline: fetch candidates, select, hand off to the engine.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use meetbell_domain::{Result, RingWindow};
use tracing::debug;

use crate::engine::NotificationEngine;
use crate::ports::EventSource;
use crate::selector::select_ringable;

/// Drives one notification decision per invocation.
///
/// A fetch failure propagates to the caller (the scheduler boundary logs
/// and swallows it); engine state is untouched by a failed cycle, so the
/// next aligned tick simply retries.
pub struct MeetingMonitor {
    source: Arc<dyn EventSource>,
    engine: Arc<NotificationEngine>,
    window: RingWindow,
}

impl MeetingMonitor {
    /// Create a monitor over the given source and engine.
    ///
    /// `window` should match the window the engine was configured with so
    /// selection and timeout arming agree.
    pub fn new(
        source: Arc<dyn EventSource>,
        engine: Arc<NotificationEngine>,
        window: RingWindow,
    ) -> Self {
        Self { source, engine, window }
    }

    /// Run one poll cycle at the current wall-clock instant.
    pub async fn poll_once(&self) -> Result<()> {
        self.poll_at(Utc::now()).await
    }

    /// Run one poll cycle as of `now` (injected for deterministic tests).
    pub async fn poll_at(&self, now: DateTime<Utc>) -> Result<()> {
        let (from, to) = self.window.fetch_range(now);
        let candidates = self.source.fetch_events(from, to).await?;
        debug!(candidates = candidates.len(), %from, %to, "Fetched candidate meetings");

        let decision = select_ringable(&candidates, now, &self.window).cloned();
        self.engine.observe(decision, now);
        Ok(())
    }
}

impl std::fmt::Debug for MeetingMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeetingMonitor").field("window", &self.window).finish()
    }
}

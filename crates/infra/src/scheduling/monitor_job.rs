//! Glue between the poll scheduler and the core pipeline.

use std::sync::Arc;

use async_trait::async_trait;
use meetbell_core::MeetingMonitor;
use meetbell_domain::Result;

use crate::scheduling::poll_scheduler::PollJob;

/// Adapts a [`MeetingMonitor`] to the scheduler's [`PollJob`] contract.
///
/// One cycle is one `poll_once`; fetch failures propagate so the scheduler
/// boundary can log and count them without touching engine state.
pub struct MonitorJob {
    monitor: Arc<MeetingMonitor>,
}

impl MonitorJob {
    /// Wrap a monitor for scheduling.
    pub fn new(monitor: Arc<MeetingMonitor>) -> Self {
        Self { monitor }
    }
}

#[async_trait]
impl PollJob for MonitorJob {
    async fn run(&self) -> Result<()> {
        self.monitor.poll_once().await
    }
}

impl std::fmt::Debug for MonitorJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorJob").finish()
    }
}

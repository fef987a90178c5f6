//! Wall-clock-aligned poll scheduler.
//!
//! Fires a supplied job at :00 and :30 seconds past each minute, regardless
//! of when the scheduler was started, with one adjustment: when the naive
//! delay to the next boundary is under the minimum lead, the tick skips
//! forward one half-period so clock jitter never produces two near-immediate
//! fires. Join handles are tracked, cancellation is explicit, and every job
//! execution is wrapped in a timeout.
//!
//! A failing or timed-out job is logged and counted; the loop is
//! self-healing and simply fires again at the next aligned tick.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use meetbell_infra::observability::PollMetrics;
//! use meetbell_infra::scheduling::{PollJob, PollScheduler, PollSchedulerConfig, SchedulerResult};
//!
//! struct NoopJob;
//!
//! #[async_trait]
//! impl PollJob for NoopJob {
//!     async fn run(&self) -> meetbell_domain::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! # async fn example() -> SchedulerResult<()> {
//! let metrics = Arc::new(PollMetrics::new());
//! let job = Arc::new(NoopJob);
//! let mut scheduler =
//!     PollScheduler::with_config(PollSchedulerConfig::default(), job, metrics);
//!
//! scheduler.start();
//! // ... application runs ...
//! scheduler.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Timelike, Utc};
use meetbell_domain::constants::{
    MIN_TICK_LEAD_SECS, POLL_HALF_PERIOD_SECS, POLL_JOB_TIMEOUT_SECS,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::observability::{MetricsResult, PollMetrics};
use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// Trait representing one poll cycle of work.
#[async_trait]
pub trait PollJob: Send + Sync {
    /// Execute the cycle.
    async fn run(&self) -> meetbell_domain::Result<()>;
}

/// Configuration for the poll scheduler.
#[derive(Debug, Clone)]
pub struct PollSchedulerConfig {
    /// Tick spacing within the minute (ticks land on multiples of this).
    pub half_period: Duration,
    /// Minimum lead before the next boundary; shorter naive delays skip
    /// forward one half-period.
    pub min_lead: Duration,
    /// Timeout applied to a single job execution.
    pub job_timeout: Duration,
    /// Timeout for awaiting the loop task handle on stop.
    pub join_timeout: Duration,
}

impl Default for PollSchedulerConfig {
    fn default() -> Self {
        Self {
            half_period: Duration::from_secs(POLL_HALF_PERIOD_SECS),
            min_lead: Duration::from_secs(MIN_TICK_LEAD_SECS),
            job_timeout: Duration::from_secs(POLL_JOB_TIMEOUT_SECS),
            join_timeout: Duration::from_secs(5),
        }
    }
}

/// Delay from `now` to the next aligned tick.
///
/// Ticks land on wall-clock multiples of `half_period` within the minute
/// (:00 and :30 for the default 30s). A naive delay under `min_lead` is
/// pushed out one half-period to avoid a near-instant double fire.
pub fn delay_until_next_tick(
    now: DateTime<Utc>,
    half_period: Duration,
    min_lead: Duration,
) -> Duration {
    let half_ms = i64::try_from(half_period.as_millis()).unwrap_or(i64::MAX).max(1);
    let into_minute =
        i64::from(now.second()) * 1000 + i64::from(now.timestamp_subsec_millis());

    // In (0, half_ms]: an exact boundary waits a full half-period.
    let mut delay_ms = half_ms - (into_minute % half_ms);
    if delay_ms < i64::try_from(min_lead.as_millis()).unwrap_or(i64::MAX) {
        delay_ms += half_ms;
    }
    Duration::from_millis(delay_ms.unsigned_abs())
}

/// Poll scheduler with explicit lifecycle management.
///
/// `start` and `stop` are idempotent: starting an active scheduler or
/// stopping an idle one is a no-op.
pub struct PollScheduler {
    config: PollSchedulerConfig,
    job: Arc<dyn PollJob>,
    metrics: Arc<PollMetrics>,
    cancellation: CancellationToken,
    loop_handle: Option<JoinHandle<()>>,
}

impl PollScheduler {
    /// Create a scheduler with the default configuration.
    pub fn new(job: Arc<dyn PollJob>, metrics: Arc<PollMetrics>) -> Self {
        Self::with_config(PollSchedulerConfig::default(), job, metrics)
    }

    /// Create a scheduler with a custom configuration.
    pub fn with_config(
        config: PollSchedulerConfig,
        job: Arc<dyn PollJob>,
        metrics: Arc<PollMetrics>,
    ) -> Self {
        Self {
            config,
            job,
            metrics,
            cancellation: CancellationToken::new(),
            loop_handle: None,
        }
    }

    /// Start the scheduler: fire the job once immediately, then on every
    /// aligned tick. No-op when already running.
    #[instrument(skip(self))]
    pub fn start(&mut self) {
        if self.is_running() {
            debug!("Poll scheduler already running");
            return;
        }

        self.cancellation = CancellationToken::new();
        let cancel = self.cancellation.clone();
        let job = Arc::clone(&self.job);
        let metrics = Arc::clone(&self.metrics);
        let config = self.config.clone();

        self.loop_handle = Some(tokio::spawn(async move {
            Self::run_loop(job, config, metrics, cancel).await;
        }));
        info!("Poll scheduler started");
    }

    /// Stop the scheduler and wait for the loop task to finish. No-op when
    /// idle.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        let handle = match self.loop_handle.take() {
            Some(handle) => handle,
            None => {
                debug!("Poll scheduler already stopped");
                return Ok(());
            }
        };

        self.cancellation.cancel();

        let join_timeout = self.config.join_timeout;
        match tokio::time::timeout(join_timeout, handle).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => return Err(SchedulerError::JoinFailed(err.to_string())),
            Err(_) => {
                return Err(SchedulerError::StopTimeout { seconds: join_timeout.as_secs() })
            }
        }

        info!("Poll scheduler stopped");
        Ok(())
    }

    /// Returns true when the loop task is active.
    pub fn is_running(&self) -> bool {
        self.loop_handle.is_some()
    }

    async fn run_loop(
        job: Arc<dyn PollJob>,
        config: PollSchedulerConfig,
        metrics: Arc<PollMetrics>,
        cancel: CancellationToken,
    ) {
        // First cycle fires immediately; alignment only governs reschedules.
        Self::execute_job(&job, config.job_timeout, &metrics).await;

        loop {
            let delay = delay_until_next_tick(Utc::now(), config.half_period, config.min_lead);
            debug!(?delay, "Next poll tick scheduled");

            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Poll loop cancelled");
                    return;
                }
                () = tokio::time::sleep(delay) => {}
            }

            Self::execute_job(&job, config.job_timeout, &metrics).await;
        }
    }

    async fn execute_job(job: &Arc<dyn PollJob>, job_timeout: Duration, metrics: &Arc<PollMetrics>) {
        log_metric(metrics.record_poll(), "scheduler.poll.invoked");
        let started = Instant::now();

        match tokio::time::timeout(job_timeout, job.run()).await {
            Ok(Ok(())) => {
                log_metric(
                    metrics.record_poll_duration(started.elapsed()),
                    "scheduler.poll.duration",
                );
                debug!("Poll cycle finished successfully");
            }
            Ok(Err(err)) => {
                log_metric(metrics.record_poll_error(), "scheduler.poll.error");
                log_metric(
                    metrics.record_poll_duration(started.elapsed()),
                    "scheduler.poll.duration",
                );
                error!(error = ?err, "Poll cycle failed; retrying at next tick");
            }
            Err(elapsed) => {
                log_metric(metrics.record_poll_timeout(), "scheduler.poll.timeout");
                warn!(timeout_secs = job_timeout.as_secs(), "Poll cycle timed out");
                debug!(elapsed = ?elapsed, "Timeout details");
            }
        }
    }
}

fn log_metric(result: MetricsResult<()>, metric: &'static str) {
    if let Err(err) = result {
        warn!(metric = metric, error = ?err, "Failed to record scheduler metric");
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("PollScheduler dropped while running; cancelling loop task");
            self.cancellation.cancel();
        }
    }
}

impl std::fmt::Debug for PollScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollScheduler")
            .field("config", &self.config)
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};

    use chrono::TimeZone;

    use super::*;

    fn at_second(second: u32, milli: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, 10, 14, second)
            .unwrap()
            .with_nanosecond(milli * 1_000_000)
            .unwrap()
    }

    fn defaults() -> (Duration, Duration) {
        (Duration::from_secs(30), Duration::from_secs(10))
    }

    #[test]
    fn delay_targets_the_next_half_minute_boundary() {
        let (half, lead) = defaults();
        // Second 47: 13s to :00, above the lead threshold.
        assert_eq!(delay_until_next_tick(at_second(47, 0), half, lead), Duration::from_secs(13));
        // Second 12: 18s to :30.
        assert_eq!(delay_until_next_tick(at_second(12, 0), half, lead), Duration::from_secs(18));
    }

    #[test]
    fn short_lead_skips_forward_one_half_period() {
        let (half, lead) = defaults();
        // Second 52: 8s to :00 is under the 10s lead, so :30 it is.
        assert_eq!(delay_until_next_tick(at_second(52, 0), half, lead), Duration::from_secs(38));
        // 29.5s: 500ms to the boundary, skipped to 30.5s.
        assert_eq!(
            delay_until_next_tick(at_second(29, 500), half, lead),
            Duration::from_millis(30_500)
        );
    }

    #[test]
    fn exact_boundary_waits_a_full_half_period() {
        let (half, lead) = defaults();
        assert_eq!(delay_until_next_tick(at_second(30, 0), half, lead), Duration::from_secs(30));
        assert_eq!(delay_until_next_tick(at_second(0, 0), half, lead), Duration::from_secs(30));
    }

    struct CountingJob {
        runs: AtomicU64,
        fail: bool,
    }

    impl CountingJob {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self { runs: AtomicU64::new(0), fail })
        }

        fn runs(&self) -> u64 {
            self.runs.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PollJob for CountingJob {
        async fn run(&self) -> meetbell_domain::Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(meetbell_domain::MeetBellError::Fetch("scripted failure".into()));
            }
            Ok(())
        }
    }

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn start_invokes_the_job_immediately() {
        let job = CountingJob::new(false);
        let metrics = Arc::new(PollMetrics::new());
        let mut scheduler = PollScheduler::new(job.clone(), metrics.clone());

        scheduler.start();
        settle().await;
        assert_eq!(job.runs(), 1);
        assert_eq!(metrics.polls(), 1);

        scheduler.stop().await.unwrap();
        assert!(!scheduler.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn job_failures_do_not_stop_the_loop() {
        let job = CountingJob::new(true);
        let metrics = Arc::new(PollMetrics::new());
        let mut scheduler = PollScheduler::new(job.clone(), metrics.clone());

        scheduler.start();
        settle().await;

        // Each advance spans more than a full minute, so at least one
        // aligned tick fires inside it despite the scripted failures.
        tokio::time::advance(Duration::from_secs(61)).await;
        settle().await;
        tokio::time::advance(Duration::from_secs(61)).await;
        settle().await;

        assert!(job.runs() >= 3, "expected repeated fires, got {}", job.runs());
        assert_eq!(metrics.poll_errors(), job.runs());

        scheduler.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn start_and_stop_are_idempotent() {
        let job = CountingJob::new(false);
        let metrics = Arc::new(PollMetrics::new());
        let mut scheduler = PollScheduler::new(job.clone(), metrics);

        let mut idle = PollScheduler::new(job, Arc::new(PollMetrics::new()));
        idle.stop().await.unwrap();

        scheduler.start();
        scheduler.start();
        assert!(scheduler.is_running());

        scheduler.stop().await.unwrap();
        scheduler.stop().await.unwrap();
        assert!(!scheduler.is_running());
    }
}

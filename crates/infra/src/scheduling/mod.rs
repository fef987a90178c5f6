//! Scheduling infrastructure for the poll loop.
//!
//! One scheduler, one job kind: the poll scheduler fires the notification
//! pipeline on a wall-clock-aligned cadence. Runtime rules:
//! - Explicit lifecycle management (start/stop, both idempotent)
//! - Join handles for spawned tasks
//! - Cancellation token support
//! - Timeout wrapping on each job execution
//! - Structured tracing with `PollMetrics` integration

pub mod error;
pub mod monitor_job;
pub mod poll_scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use monitor_job::MonitorJob;
pub use poll_scheduler::{delay_until_next_tick, PollJob, PollScheduler, PollSchedulerConfig};

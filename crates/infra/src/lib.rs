//! # MeetBell Infrastructure
//!
//! Scheduling and observability around the core decision engine.
//!
//! This crate contains:
//! - The wall-clock-aligned poll scheduler with explicit lifecycle
//! - The job glue driving a `MeetingMonitor` per tick
//! - Poll metrics for host diagnostics
//!
//! ## Architecture
//! - Drives services defined in `meetbell-core`
//! - Owns all spawned tasks: join handles are tracked, cancellation is
//!   explicit, and job executions are wrapped in a timeout

pub mod observability;
pub mod scheduling;

// Re-export commonly used items
pub use observability::{MetricsResult, PollMetrics};
pub use scheduling::{
    delay_until_next_tick, MonitorJob, PollJob, PollScheduler, PollSchedulerConfig,
    SchedulerError, SchedulerResult,
};

//! Scheduler error types

use meetbell_domain::MeetBellError;
use thiserror::Error;

/// Scheduler-specific errors.
///
/// Start/stop are idempotent (a second `start` or a `stop` while idle is a
/// no-op), so there are no lifecycle-misuse variants; only genuine failures
/// surface here.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Stopping exceeded the configured join timeout
    #[error("Scheduler task did not stop within {seconds}s")]
    StopTimeout { seconds: u64 },

    /// Task join failed
    #[error("Scheduler task join failed: {0}")]
    JoinFailed(String),
}

impl From<SchedulerError> for MeetBellError {
    fn from(err: SchedulerError) -> Self {
        MeetBellError::Internal(err.to_string())
    }
}

/// Convenience type alias for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

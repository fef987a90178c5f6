//! Observability for the poll loop.
//!
//! Recording methods return `MetricsResult<()>` for future extensibility
//! (quotas, cardinality limits) but currently always succeed; callers log a
//! warning and continue when recording fails, never aborting the cycle.

pub mod metrics;

use thiserror::Error;

pub use metrics::PollMetrics;

/// Metrics recording error.
#[derive(Debug, Error)]
#[error("metrics recording failed: {0}")]
pub struct MetricsError(pub String);

/// Result alias for metrics recording operations.
pub type MetricsResult<T> = Result<T, MetricsError>;

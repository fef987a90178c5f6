//! Domain constants
//!
//! Centralized location for all domain-level constants used throughout the
//! notification engine.

// Ring window defaults (asymmetric by construction, symmetric by default)
pub const DEFAULT_BEFORE_WINDOW_SECS: i64 = 120;
pub const DEFAULT_AFTER_WINDOW_SECS: i64 = 120;

// Poll cadence: fires at :00 and :30 past each minute
pub const POLL_HALF_PERIOD_SECS: u64 = 30;
// A naive next-fire delay under this threshold skips forward one half-period
pub const MIN_TICK_LEAD_SECS: u64 = 10;
// Per-cycle budget for fetch + select + react
pub const POLL_JOB_TIMEOUT_SECS: u64 = 20;

// Dismiss-affordance render retry (host page may still be loading)
pub const RENDER_RETRY_MAX_ATTEMPTS: u32 = 5;
pub const RENDER_RETRY_INTERVAL_MS: u64 = 2000;

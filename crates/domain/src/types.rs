//! Core domain types: calendar events and the ring window.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_AFTER_WINDOW_SECS, DEFAULT_BEFORE_WINDOW_SECS};
use crate::errors::{MeetBellError, Result};

/// A candidate meeting record supplied by the event source.
///
/// Immutable once constructed; discarded after each poll cycle except for
/// the `id`, which may be retained in the engine's dismissed set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Stable identifier for this occurrence. Unique within a fetch batch
    /// and stable across repeated fetches of the same occurrence; assumed
    /// to already encode per-occurrence uniqueness for recurring meetings.
    pub id: String,
    /// Meeting subject line.
    pub title: String,
    /// Scheduled start time.
    pub start_time: DateTime<Utc>,
    /// Scheduled end time.
    pub end_time: DateTime<Utc>,
    /// All-day events are never ringable.
    pub is_all_day: bool,
    /// Cancelled events are never ringable.
    pub is_cancelled: bool,
    /// Whether the event carries an online-meeting surface at all.
    pub is_online_meeting: bool,
    /// Direct join link, when the source exposes one.
    pub join_url: Option<String>,
}

impl CalendarEvent {
    /// Time remaining until the meeting starts (negative once started).
    pub fn time_until_start(&self, now: DateTime<Utc>) -> Duration {
        self.start_time - now
    }
}

/// The interval around a meeting's start during which notification is
/// permitted: `[start - before, start + after]`, bounds inclusive.
///
/// Both durations are non-negative; they may differ in magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingWindow {
    before: Duration,
    after: Duration,
}

impl Default for RingWindow {
    fn default() -> Self {
        Self {
            before: Duration::seconds(DEFAULT_BEFORE_WINDOW_SECS),
            after: Duration::seconds(DEFAULT_AFTER_WINDOW_SECS),
        }
    }
}

impl RingWindow {
    /// Create a window from non-negative `before`/`after` durations.
    pub fn new(before: Duration, after: Duration) -> Result<Self> {
        if before < Duration::zero() || after < Duration::zero() {
            return Err(MeetBellError::InvalidInput(format!(
                "ring window durations must be non-negative (before={before}, after={after})"
            )));
        }
        Ok(Self { before, after })
    }

    /// Duration before the start time during which ringing is permitted.
    pub fn before(&self) -> Duration {
        self.before
    }

    /// Duration after the start time during which ringing is permitted.
    pub fn after(&self) -> Duration {
        self.after
    }

    /// Whether `now` lies within the ring window around `start`.
    ///
    /// Pure time arithmetic; bounds are inclusive.
    pub fn is_ringable(&self, start: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now >= start - self.before && now <= start + self.after
    }

    /// The wide query range handed to the event source each cycle:
    /// `[now - 2*after, now + 2*before]`.
    ///
    /// The doubled margins absorb clock skew and boundary misses at the
    /// window edges.
    pub fn fetch_range(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        (now - self.after * 2, now + self.before * 2)
    }
}

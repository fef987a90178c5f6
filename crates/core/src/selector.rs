//! Meeting selection: at most one ringable meeting per poll cycle.

use chrono::{DateTime, Utc};
use meetbell_domain::{CalendarEvent, RingWindow};

/// Pick the meeting to notify about, if any.
///
/// Candidates are stable-sorted ascending by start time (ties keep fetch
/// order), all-day and cancelled entries are skipped, entries outside the
/// ring window are skipped, and the first survivor wins. Earliest-first is
/// deliberate: once a meeting becomes ringable it keeps winning as long as
/// it is the earliest, so overlapping meetings never cause flapping.
pub fn select_ringable<'a>(
    candidates: &'a [CalendarEvent],
    now: DateTime<Utc>,
    window: &RingWindow,
) -> Option<&'a CalendarEvent> {
    let mut ordered: Vec<&CalendarEvent> = candidates.iter().collect();
    ordered.sort_by_key(|event| event.start_time);

    ordered.into_iter().find(|event| {
        !event.is_all_day && !event.is_cancelled && window.is_ringable(event.start_time, now)
    })
}

//! Port interfaces for external collaborators.
//!
//! The engine never touches the DOM, the audio stack, or the calendar
//! transport directly; hosts implement these traits and inject them. Only
//! `EventSource` is async - the remaining collaborators are synchronous
//! signal/effect surfaces driven by the host's event loop.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use meetbell_domain::{CalendarEvent, Result};

/// Supplies candidate meeting records for a queried time range.
///
/// Implementations fail with [`meetbell_domain::MeetBellError::Fetch`] when
/// the source is unreachable or returns malformed data; the poll cycle logs
/// and retries at the next aligned tick.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Fetch events overlapping `[start, end]`.
    async fn fetch_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>>;
}

/// Audio notifier for the ringtone loop.
///
/// Playback failures are non-fatal; the engine logs them and arms a
/// one-shot retry for the next platform unlock signal.
pub trait Notifier: Send + Sync {
    /// Start the looping ringtone.
    fn play(&self) -> Result<()>;
    /// Stop the ringtone.
    fn stop(&self) -> Result<()>;
    /// Whether audio is currently playing.
    fn is_playing(&self) -> bool;
}

/// Dismiss (and optional join) control rendered by the host.
///
/// `install` may fail while the host page is still laying out; the engine
/// retries on a fixed interval up to a capped attempt count and otherwise
/// rings without a visible control (accepted degraded mode). The host wires
/// clicks on the control to [`crate::NotificationEngine::dismiss`].
pub trait AffordanceUi: Send + Sync {
    /// Insert the dismiss control for `event`.
    fn install(&self, event: &CalendarEvent) -> Result<()>;
    /// Remove the control, if present.
    fn remove(&self) -> Result<()>;
}

/// Callback receiving raw "user is joining or in call" samples.
pub type JoinCallback = Box<dyn Fn(bool) + Send + Sync>;

/// Push-based source of join-state samples (a DOM mutation observer in the
/// browser host). The engine performs the edge detection itself, so the
/// logic is testable with synthetic sample sequences.
pub trait JoinDetector: Send + Sync {
    /// Register a callback; the returned subscription unsubscribes on drop.
    fn subscribe(&self, callback: JoinCallback) -> JoinSubscription;
}

/// Handle to an active join-detector registration.
///
/// Dropping the subscription detaches the callback.
pub struct JoinSubscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl JoinSubscription {
    /// Wrap an unsubscribe action supplied by the detector.
    pub fn new(unsubscribe: impl FnOnce() + Send + 'static) -> Self {
        Self { unsubscribe: Some(Box::new(unsubscribe)) }
    }

    /// A subscription with nothing to detach (for detectors that manage
    /// registration externally).
    pub fn noop() -> Self {
        Self { unsubscribe: None }
    }
}

impl Drop for JoinSubscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl std::fmt::Debug for JoinSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JoinSubscription")
            .field("attached", &self.unsubscribe.is_some())
            .finish()
    }
}

/// Host hooks invoked on notification state changes.
///
/// At most one listener is active at a time (replacement semantics on
/// registration); each hook fires at most once per relevant state change
/// per poll cycle.
pub trait MeetingListener: Send + Sync {
    /// A new notification started ringing for `event`.
    fn on_upcoming_meeting(&self, event: &CalendarEvent);
    /// A poll cycle found no ringable meeting (fired on the transition into
    /// the quiet state, not on every quiet cycle).
    fn on_no_upcoming_meetings(&self);
}

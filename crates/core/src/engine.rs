//! Notification lifecycle state machine.
//!
//! Owns the single active notification and the dismissed-suppression memory.
//! Transitions are driven by poll-cycle decisions ([`NotificationEngine::observe`]),
//! user dismissal, the armed post-start timeout, and join-signal edges. All
//! state lives behind one mutex on an explicit owned instance - no
//! process-wide singletons - so tests can run independent engines side by
//! side.
//!
//! Side-effect failures (audio, affordance rendering) are logged and
//! swallowed; they never corrupt the state machine invariants.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use meetbell_domain::constants::{RENDER_RETRY_INTERVAL_MS, RENDER_RETRY_MAX_ATTEMPTS};
use meetbell_domain::{CalendarEvent, RingWindow};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::ports::{AffordanceUi, JoinDetector, JoinSubscription, MeetingListener, Notifier};

/// Configuration for the notification engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Ring window applied when arming the post-start timeout.
    pub window: RingWindow,
    /// Maximum dismiss-affordance install attempts per ring.
    pub render_retry_attempts: u32,
    /// Fixed interval between affordance install attempts.
    pub render_retry_interval: StdDuration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window: RingWindow::default(),
            render_retry_attempts: RENDER_RETRY_MAX_ATTEMPTS,
            render_retry_interval: StdDuration::from_millis(RENDER_RETRY_INTERVAL_MS),
        }
    }
}

/// The one ring permitted at a time.
struct ActiveRing {
    event: CalendarEvent,
    /// Join-signal level sampled at ring start. A join edge only stops the
    /// ring when this was false (a genuinely new join, not a call the user
    /// was already in).
    join_baseline: bool,
    /// Cancels the timeout and render-retry tasks for this ring.
    guard: CancellationToken,
    /// One-shot playback retry, armed when the initial `play` failed.
    playback_retry_armed: bool,
}

#[derive(Default)]
struct EngineState {
    active: Option<ActiveRing>,
    /// Suppression memory: ids dismissed while ringable. Cleared exactly
    /// when a poll cycle reports zero ringable meetings.
    dismissed: HashSet<String>,
    /// Whether the previous cycle was quiet (gates the listener edge).
    quiet: bool,
    /// Last raw join-detector sample.
    in_call: bool,
}

/// Notification state machine: idle/ringing plus the dismissed set.
///
/// Construct with injected [`Notifier`] and [`AffordanceUi`] ports, register
/// an optional [`MeetingListener`], then feed it one decision per poll cycle
/// via [`observe`](Self::observe). Methods that arm timers
/// (`observe`) must run inside a tokio runtime.
pub struct NotificationEngine {
    config: EngineConfig,
    notifier: Arc<dyn Notifier>,
    affordance: Arc<dyn AffordanceUi>,
    listener: Mutex<Option<Arc<dyn MeetingListener>>>,
    state: Mutex<EngineState>,
}

impl NotificationEngine {
    /// Create an engine with the default configuration.
    pub fn new(notifier: Arc<dyn Notifier>, affordance: Arc<dyn AffordanceUi>) -> Self {
        Self::with_config(EngineConfig::default(), notifier, affordance)
    }

    /// Create an engine with a custom configuration.
    pub fn with_config(
        config: EngineConfig,
        notifier: Arc<dyn Notifier>,
        affordance: Arc<dyn AffordanceUi>,
    ) -> Self {
        Self {
            config,
            notifier,
            affordance,
            listener: Mutex::new(None),
            state: Mutex::new(EngineState::default()),
        }
    }

    /// Register the host listener, replacing any previous one.
    ///
    /// At most one listener is active at a time.
    pub fn set_listener(&self, listener: Arc<dyn MeetingListener>) {
        *self.listener.lock() = Some(listener);
    }

    /// Remove the registered listener, if any.
    pub fn clear_listener(&self) {
        *self.listener.lock() = None;
    }

    /// Subscribe this engine to a join detector.
    ///
    /// Raw samples flow into [`handle_join_sample`](Self::handle_join_sample);
    /// dropping the returned subscription detaches the engine.
    pub fn attach_join_detector(
        self: &Arc<Self>,
        detector: &dyn JoinDetector,
    ) -> JoinSubscription {
        let engine = Arc::downgrade(self);
        detector.subscribe(Box::new(move |in_call| {
            if let Some(engine) = engine.upgrade() {
                engine.handle_join_sample(in_call);
            }
        }))
    }

    /// React to one poll cycle's selector decision.
    ///
    /// `now` is the instant the cycle sampled; the post-start timeout is
    /// armed relative to it so a late-detected meeting still self-terminates
    /// exactly `after` past its start.
    pub fn observe(self: &Arc<Self>, decision: Option<CalendarEvent>, now: DateTime<Utc>) {
        match decision {
            Some(event) => self.observe_candidate(event, now),
            None => self.observe_quiet(),
        }
    }

    /// User clicked the dismiss control.
    pub fn dismiss(&self) {
        let ring = {
            let mut state = self.state.lock();
            let ring = state.active.take();
            if let Some(ring) = &ring {
                state.dismissed.insert(ring.event.id.clone());
            }
            ring
        };
        if let Some(ring) = ring {
            self.stop_ring_effects(&ring, "user dismiss");
        }
    }

    /// Feed one raw join-detector sample.
    ///
    /// Stops the ring only on a false-to-true edge while the baseline
    /// captured at ring start was false.
    pub fn handle_join_sample(&self, in_call: bool) {
        let ring = {
            let mut state = self.state.lock();
            let previous = state.in_call;
            state.in_call = in_call;

            let new_join = in_call && !previous;
            let stops = new_join
                && state.active.as_ref().is_some_and(|ring| !ring.join_baseline);
            if !stops {
                return;
            }
            let ring = state.active.take();
            if let Some(ring) = &ring {
                state.dismissed.insert(ring.event.id.clone());
            }
            ring
        };
        if let Some(ring) = ring {
            self.stop_ring_effects(&ring, "join detected");
        }
    }

    /// Platform audio unlock: retry a failed playback once per ring.
    pub fn handle_unlock(&self) {
        let retry = {
            let mut state = self.state.lock();
            match state.active.as_mut() {
                Some(ring) if ring.playback_retry_armed => {
                    ring.playback_retry_armed = false;
                    true
                }
                _ => false,
            }
        };
        if retry && !self.notifier.is_playing() {
            if let Err(err) = self.notifier.play() {
                warn!(error = ?err, "Playback retry after unlock failed");
            } else {
                debug!("Playback recovered after platform unlock");
            }
        }
    }

    /// Dispose the engine: cancel armed timers and exit any active ring as
    /// if dismissed.
    pub fn shutdown(&self) {
        let ring = {
            let mut state = self.state.lock();
            let ring = state.active.take();
            if let Some(ring) = &ring {
                state.dismissed.insert(ring.event.id.clone());
            }
            ring
        };
        if let Some(ring) = ring {
            self.stop_ring_effects(&ring, "engine shutdown");
        }
    }

    /// Whether a notification is currently ringing.
    pub fn is_ringing(&self) -> bool {
        self.state.lock().active.is_some()
    }

    /// Identifier of the actively ringing event, if any.
    pub fn active_event_id(&self) -> Option<String> {
        self.state.lock().active.as_ref().map(|ring| ring.event.id.clone())
    }

    fn observe_candidate(self: &Arc<Self>, event: CalendarEvent, now: DateTime<Utc>) {
        let started = {
            let mut state = self.state.lock();
            state.quiet = false;

            if let Some(active) = &state.active {
                // At-most-one invariant: the existing ring continues
                // uninterrupted, same id or not.
                debug!(
                    active_id = %active.event.id,
                    candidate_id = %event.id,
                    "Ring already active; candidate ignored"
                );
                None
            } else if state.dismissed.contains(&event.id) {
                debug!(event_id = %event.id, "Candidate suppressed by dismissed set");
                None
            } else {
                let guard = CancellationToken::new();
                state.active = Some(ActiveRing {
                    event: event.clone(),
                    join_baseline: state.in_call,
                    guard: guard.clone(),
                    playback_retry_armed: false,
                });
                Some(guard)
            }
        };

        if let Some(guard) = started {
            self.begin_ring_effects(&event, now, guard);
        }
    }

    fn observe_quiet(&self) {
        let (ring, entered_quiet) = {
            let mut state = self.state.lock();
            let ring = state.active.take();
            // Quiet period resets the suppression history.
            state.dismissed.clear();
            let entered_quiet = !state.quiet;
            state.quiet = true;
            (ring, entered_quiet)
        };

        if let Some(ring) = ring {
            self.stop_ring_effects(&ring, "no ringable meeting");
        }
        if entered_quiet {
            if let Some(listener) = self.listener.lock().clone() {
                listener.on_no_upcoming_meetings();
            }
        }
    }

    fn begin_ring_effects(
        self: &Arc<Self>,
        event: &CalendarEvent,
        now: DateTime<Utc>,
        guard: CancellationToken,
    ) {
        info!(event_id = %event.id, title = %event.title, "Notification ringing");

        if let Err(err) = self.notifier.play() {
            warn!(event_id = %event.id, error = ?err, "Ringtone failed to start");
            let mut state = self.state.lock();
            if let Some(ring) = state.active.as_mut() {
                if ring.event.id == event.id {
                    ring.playback_retry_armed = true;
                }
            }
        }

        match self.affordance.install(event) {
            Ok(()) => debug!(event_id = %event.id, "Dismiss affordance installed"),
            Err(err) => {
                warn!(event_id = %event.id, error = ?err, "Dismiss affordance install failed");
                self.spawn_render_retry(event.clone(), guard.clone());
            }
        }

        self.spawn_timeout(event, now, guard);

        if let Some(listener) = self.listener.lock().clone() {
            listener.on_upcoming_meeting(event);
        }
    }

    /// Arm the self-termination timer: fires `(start - now) + after` from
    /// now, i.e. exactly `after` past the meeting start (clamped at zero
    /// when the window has nearly elapsed at detection time).
    fn spawn_timeout(self: &Arc<Self>, event: &CalendarEvent, now: DateTime<Utc>, guard: CancellationToken) {
        let deadline = (event.start_time - now) + self.config.window.after();
        let sleep = deadline.to_std().unwrap_or(StdDuration::ZERO);
        let engine = Arc::downgrade(self);
        let event_id = event.id.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = guard.cancelled() => {}
                () = tokio::time::sleep(sleep) => {
                    if let Some(engine) = engine.upgrade() {
                        engine.expire(&event_id);
                    }
                }
            }
        });
    }

    fn spawn_render_retry(self: &Arc<Self>, event: CalendarEvent, guard: CancellationToken) {
        let affordance = Arc::clone(&self.affordance);
        let max_attempts = self.config.render_retry_attempts;
        let interval = self.config.render_retry_interval;

        tokio::spawn(async move {
            // The inline attempt in begin_ring_effects was attempt one.
            let mut attempt = 1u32;
            while attempt < max_attempts {
                tokio::select! {
                    _ = guard.cancelled() => return,
                    () = tokio::time::sleep(interval) => {}
                }
                attempt += 1;
                match affordance.install(&event) {
                    Ok(()) => {
                        debug!(event_id = %event.id, attempt, "Dismiss affordance installed");
                        return;
                    }
                    Err(err) => {
                        warn!(
                            event_id = %event.id,
                            attempt,
                            error = ?err,
                            "Dismiss affordance install failed"
                        );
                    }
                }
            }
            warn!(
                event_id = %event.id,
                max_attempts,
                "Dismiss affordance never rendered; ringing without a visible control"
            );
        });
    }

    /// Post-start timeout fired for `event_id`.
    fn expire(&self, event_id: &str) {
        let ring = {
            let mut state = self.state.lock();
            match &state.active {
                Some(ring) if ring.event.id == event_id => {
                    state.dismissed.insert(event_id.to_string());
                    state.active.take()
                }
                _ => None,
            }
        };
        if let Some(ring) = ring {
            self.stop_ring_effects(&ring, "post-start timeout");
        }
    }

    fn stop_ring_effects(&self, ring: &ActiveRing, reason: &'static str) {
        ring.guard.cancel();
        if let Err(err) = self.notifier.stop() {
            warn!(event_id = %ring.event.id, error = ?err, "Ringtone failed to stop");
        }
        if let Err(err) = self.affordance.remove() {
            warn!(event_id = %ring.event.id, error = ?err, "Dismiss affordance removal failed");
        }
        info!(event_id = %ring.event.id, reason, "Notification stopped");
    }
}

impl std::fmt::Debug for NotificationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationEngine")
            .field("config", &self.config)
            .field("ringing", &self.is_ringing())
            .finish()
    }
}

//! In-memory mock ports shared by the core integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use meetbell_core::ports::{
    AffordanceUi, EventSource, JoinCallback, JoinDetector, JoinSubscription, MeetingListener,
    Notifier,
};
use meetbell_domain::{CalendarEvent, MeetBellError, Result};

/// Build a plain online-meeting event for tests.
pub fn test_event(id: &str, start: DateTime<Utc>) -> CalendarEvent {
    CalendarEvent {
        id: id.to_string(),
        title: format!("meeting {id}"),
        start_time: start,
        end_time: start + Duration::minutes(30),
        is_all_day: false,
        is_cancelled: false,
        is_online_meeting: true,
        join_url: Some(format!("https://example.test/join/{id}")),
    }
}

/// Scriptable `EventSource`: serves a fixed batch, optionally failing the
/// next fetch, and records the last queried range.
#[derive(Default)]
pub struct MockEventSource {
    events: Mutex<Vec<CalendarEvent>>,
    fail_next: Mutex<bool>,
    last_range: Mutex<Option<(DateTime<Utc>, DateTime<Utc>)>>,
}

impl MockEventSource {
    pub fn new(events: Vec<CalendarEvent>) -> Self {
        Self { events: Mutex::new(events), ..Self::default() }
    }

    pub fn set_events(&self, events: Vec<CalendarEvent>) {
        *self.events.lock().unwrap() = events;
    }

    pub fn fail_next_fetch(&self) {
        *self.fail_next.lock().unwrap() = true;
    }

    pub fn last_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        *self.last_range.lock().unwrap()
    }
}

#[async_trait]
impl EventSource for MockEventSource {
    async fn fetch_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>> {
        *self.last_range.lock().unwrap() = Some((start, end));
        let mut fail = self.fail_next.lock().unwrap();
        if *fail {
            *fail = false;
            return Err(MeetBellError::Fetch("calendar view unreachable".into()));
        }
        Ok(self.events.lock().unwrap().clone())
    }
}

/// Audio notifier mock with scriptable play failures.
#[derive(Default)]
pub struct MockNotifier {
    playing: Mutex<bool>,
    play_calls: AtomicU32,
    stop_calls: AtomicU32,
    failing_plays: AtomicU32,
}

impl MockNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make the next `count` play attempts fail.
    pub fn fail_plays(&self, count: u32) {
        self.failing_plays.store(count, Ordering::SeqCst);
    }

    pub fn play_calls(&self) -> u32 {
        self.play_calls.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> u32 {
        self.stop_calls.load(Ordering::SeqCst)
    }
}

impl Notifier for MockNotifier {
    fn play(&self) -> Result<()> {
        self.play_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failing_plays.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_plays.store(remaining - 1, Ordering::SeqCst);
            return Err(MeetBellError::Playback("audio engine not unlocked".into()));
        }
        *self.playing.lock().unwrap() = true;
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        *self.playing.lock().unwrap() = false;
        Ok(())
    }

    fn is_playing(&self) -> bool {
        *self.playing.lock().unwrap()
    }
}

/// Affordance mock with scriptable install failures.
#[derive(Default)]
pub struct MockAffordance {
    installed: Mutex<Option<String>>,
    install_attempts: AtomicU32,
    failing_installs: AtomicU32,
}

impl MockAffordance {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make the next `count` install attempts fail (host layout pending).
    pub fn fail_installs(&self, count: u32) {
        self.failing_installs.store(count, Ordering::SeqCst);
    }

    pub fn installed_for(&self) -> Option<String> {
        self.installed.lock().unwrap().clone()
    }

    pub fn install_attempts(&self) -> u32 {
        self.install_attempts.load(Ordering::SeqCst)
    }
}

impl AffordanceUi for MockAffordance {
    fn install(&self, event: &CalendarEvent) -> Result<()> {
        self.install_attempts.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failing_installs.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_installs.store(remaining - 1, Ordering::SeqCst);
            return Err(MeetBellError::Render("host layout not ready".into()));
        }
        *self.installed.lock().unwrap() = Some(event.id.clone());
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        *self.installed.lock().unwrap() = None;
        Ok(())
    }
}

/// Listener recording every hook invocation.
#[derive(Default)]
pub struct RecordingListener {
    upcoming: Mutex<Vec<String>>,
    quiet_calls: AtomicU32,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn upcoming_ids(&self) -> Vec<String> {
        self.upcoming.lock().unwrap().clone()
    }

    pub fn quiet_calls(&self) -> u32 {
        self.quiet_calls.load(Ordering::SeqCst)
    }
}

impl MeetingListener for RecordingListener {
    fn on_upcoming_meeting(&self, event: &CalendarEvent) {
        self.upcoming.lock().unwrap().push(event.id.clone());
    }

    fn on_no_upcoming_meetings(&self) {
        self.quiet_calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Join detector holding at most one subscriber, driven manually.
#[derive(Default)]
pub struct ManualJoinDetector {
    callback: Arc<Mutex<Option<JoinCallback>>>,
}

impl ManualJoinDetector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Deliver one raw sample to the subscriber, if attached.
    pub fn emit(&self, in_call: bool) {
        if let Some(callback) = self.callback.lock().unwrap().as_ref() {
            callback(in_call);
        }
    }

    pub fn has_subscriber(&self) -> bool {
        self.callback.lock().unwrap().is_some()
    }
}

impl JoinDetector for ManualJoinDetector {
    fn subscribe(&self, callback: JoinCallback) -> JoinSubscription {
        *self.callback.lock().unwrap() = Some(callback);
        let slot = Arc::clone(&self.callback);
        JoinSubscription::new(move || {
            *slot.lock().unwrap() = None;
        })
    }
}

//! # MeetBell Core
//!
//! Pure business logic for the meeting notification engine - no
//! infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces (traits) for all external collaborators
//! - The meeting selector (earliest-ringable-wins policy)
//! - The notification lifecycle state machine
//! - The per-cycle poll pipeline
//!
//! ## Architecture Principles
//! - Only depends on `meetbell-domain`
//! - No DOM, audio, or transport code
//! - All external dependencies via traits
//! - Pure, testable decision logic

pub mod engine;
pub mod monitor;
pub mod ports;
pub mod selector;

pub use engine::{EngineConfig, NotificationEngine};
pub use monitor::MeetingMonitor;
pub use ports::{
    AffordanceUi, EventSource, JoinCallback, JoinDetector, JoinSubscription, MeetingListener,
    Notifier,
};
pub use selector::select_ringable;

//! # MeetBell Domain
//!
//! Business domain types for the meeting notification engine.
//!
//! This crate contains:
//! - Domain data types (CalendarEvent, RingWindow)
//! - Domain error types and Result definitions
//! - Domain constants
//!
//! ## Architecture
//! - No dependencies on other MeetBell crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use errors::*;
pub use types::*;

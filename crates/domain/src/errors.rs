//! Error types used throughout the notification engine

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for MeetBell
///
/// The three collaborator-facing kinds (`Fetch`, `Render`, `Playback`) are
/// caught at the poll-cycle or ring side-effect boundary, logged, and
/// swallowed; they never abort the scheduler or corrupt engine state.
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum MeetBellError {
    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Playback error: {0}")]
    Playback(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for MeetBell operations
pub type Result<T> = std::result::Result<T, MeetBellError>;

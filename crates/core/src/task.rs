//! Task status wire types and the client-side polling state machine.
//!
//! The backend reports a task as a loosely-typed JSON object; this module
//! gives it a typed shape ([`TaskSnapshot`]) and defines which poll
//! responses end the loop.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::TaskId;

// ---------------------------------------------------------------------------
// Status constants
// ---------------------------------------------------------------------------

/// Task accepted but not yet started.
pub const STATUS_PENDING: &str = "pending";
/// In-progress word used by the current backend.
pub const STATUS_PROCESSING: &str = "processing";
/// Alternate in-progress word.
pub const STATUS_RUNNING: &str = "running";
/// Terminal success.
pub const STATUS_COMPLETED: &str = "completed";
/// Terminal failure.
pub const STATUS_ERROR: &str = "error";

/// Upper bound of the progress percentage.
pub const MAX_PROGRESS: u8 = 100;

// ---------------------------------------------------------------------------
// TaskStatus
// ---------------------------------------------------------------------------

/// Status string reported by `GET /api/status/{task_id}`.
///
/// Unknown values are preserved in [`TaskStatus::Other`] and treated as
/// in-progress so a newer backend cannot stall the client.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TaskStatus {
    #[default]
    Pending,
    Processing,
    Running,
    Completed,
    Error,
    Other(String),
}

impl TaskStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Pending => STATUS_PENDING,
            TaskStatus::Processing => STATUS_PROCESSING,
            TaskStatus::Running => STATUS_RUNNING,
            TaskStatus::Completed => STATUS_COMPLETED,
            TaskStatus::Error => STATUS_ERROR,
            TaskStatus::Other(s) => s,
        }
    }

    /// Only `completed` and `error` end the polling loop.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Error)
    }
}

impl From<&str> for TaskStatus {
    fn from(s: &str) -> Self {
        match s {
            STATUS_PENDING => TaskStatus::Pending,
            STATUS_PROCESSING => TaskStatus::Processing,
            STATUS_RUNNING => TaskStatus::Running,
            STATUS_COMPLETED => TaskStatus::Completed,
            STATUS_ERROR => TaskStatus::Error,
            other => TaskStatus::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TaskStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TaskStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(TaskStatus::from(s.as_str()))
    }
}

// ---------------------------------------------------------------------------
// Poll response
// ---------------------------------------------------------------------------

/// YouTube-style metadata produced alongside the video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Result payload, present only once the task is `completed`.
///
/// Every field is optional on the wire; a missing field renders as an
/// empty region rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    #[serde(default)]
    pub video_path: Option<String>,
    #[serde(default)]
    pub video_filename: Option<String>,
    #[serde(default)]
    pub metadata: Option<VideoMetadata>,
    #[serde(default)]
    pub metadata_path: Option<String>,
}

/// One response of the status endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    #[serde(default)]
    pub task_id: Option<TaskId>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub progress: i64,
    #[serde(default)]
    pub current_step: String,
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(default)]
    pub result: Option<TaskResult>,
    #[serde(default)]
    pub error: Option<String>,
}

impl TaskSnapshot {
    /// Progress clamped into `0..=100` for display.
    pub fn percent(&self) -> u8 {
        self.progress.clamp(0, i64::from(MAX_PROGRESS)) as u8
    }

    /// The server-provided failure message, or a generic fallback.
    pub fn error_message(&self) -> String {
        match self.error.as_deref() {
            Some(msg) if !msg.trim().is_empty() => msg.to_string(),
            _ => "Task failed without an error message".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Poll state machine
// ---------------------------------------------------------------------------

/// Client-side lifecycle of one polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Polling,
    Completed,
    Error,
    Aborted,
}

impl PollState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PollState::Completed | PollState::Error | PollState::Aborted)
    }

    fn name(self) -> &'static str {
        match self {
            PollState::Idle => "Idle",
            PollState::Polling => "Polling",
            PollState::Completed => "Completed",
            PollState::Error => "Error",
            PollState::Aborted => "Aborted",
        }
    }
}

/// Returns the set of states reachable from `from`.
///
/// Terminal states return an empty slice.
pub fn valid_transitions(from: PollState) -> &'static [PollState] {
    match from {
        PollState::Idle => &[PollState::Polling],
        PollState::Polling => &[PollState::Completed, PollState::Error, PollState::Aborted],
        PollState::Completed | PollState::Error | PollState::Aborted => &[],
    }
}

/// Check whether a transition from `from` to `to` is valid.
pub fn can_transition(from: PollState, to: PollState) -> bool {
    valid_transitions(from).contains(&to)
}

/// Validate a state transition, returning an error for invalid ones.
pub fn validate_transition(from: PollState, to: PollState) -> Result<(), CoreError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition(format!(
            "{} -> {}",
            from.name(),
            to.name()
        )))
    }
}

/// The state a poll response moves a `Polling` loop into.
pub fn next_state(snapshot: &TaskSnapshot) -> PollState {
    match snapshot.status {
        TaskStatus::Completed => PollState::Completed,
        TaskStatus::Error => PollState::Error,
        _ => PollState::Polling,
    }
}

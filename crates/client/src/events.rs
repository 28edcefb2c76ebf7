//! Events emitted by the task poller.
//!
//! Each event carries the task id and the poll generation that produced
//! it, so subscribers can discard events from a superseded loop.

use mecca_core::task::TaskSnapshot;
use serde::Serialize;

/// Where a failure came from. Handling is identical; only the message
/// differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The status request failed (network, timeout, non-2xx).
    Network,
    /// The backend reported `status: "error"`.
    Server,
}

/// A state change of one polling loop.
#[derive(Debug, Clone, Serialize)]
pub enum TaskEvent {
    /// A non-terminal status response arrived.
    Progress {
        task_id: String,
        generation: u64,
        snapshot: TaskSnapshot,
    },

    /// The backend reported `completed`. No further polls follow.
    Completed {
        task_id: String,
        generation: u64,
        snapshot: TaskSnapshot,
    },

    /// The task or the status request failed. No further polls follow.
    Failed {
        task_id: String,
        generation: u64,
        kind: FailureKind,
        /// Human-readable description.
        message: String,
    },

    /// The loop was stopped or superseded before a terminal status.
    Aborted { task_id: String, generation: u64 },
}

impl TaskEvent {
    pub fn task_id(&self) -> &str {
        match self {
            TaskEvent::Progress { task_id, .. }
            | TaskEvent::Completed { task_id, .. }
            | TaskEvent::Failed { task_id, .. }
            | TaskEvent::Aborted { task_id, .. } => task_id,
        }
    }

    pub fn generation(&self) -> u64 {
        match self {
            TaskEvent::Progress { generation, .. }
            | TaskEvent::Completed { generation, .. }
            | TaskEvent::Failed { generation, .. }
            | TaskEvent::Aborted { generation, .. } => *generation,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskEvent::Progress { .. })
    }
}

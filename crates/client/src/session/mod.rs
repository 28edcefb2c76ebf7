//! Stateful controllers behind the generation page, the editor page and
//! the thumbnail studio.

mod editor;
mod task;
mod thumbnail;

pub use editor::{ClipSummary, EditOutcome, EditorSession, EditorUpdate, RegenerateOutcome};
pub use task::{Phase, TaskSession, TaskUpdate};
pub use thumbnail::ThumbnailSession;

use mecca_core::error::CoreError;

use crate::api::StudioApiError;

/// Errors from session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Api(#[from] StudioApiError),

    /// A request of the same kind is already in flight.
    #[error("{0} is already in progress")]
    Busy(&'static str),

    /// The generation task failed; carries the message shown to the user.
    #[error("{0}")]
    TaskFailed(String),

    #[error("No task has been submitted")]
    NoActiveTask,

    #[error("Polling was cancelled")]
    Cancelled,

    #[error("The video config has not been loaded")]
    NoConfig,

    #[error("No clip selected")]
    NoClipSelected,

    #[error("There are unsaved changes")]
    UnsavedChanges,

    #[error("Generate a thumbnail first")]
    NoThumbnailSession,
}

impl SessionError {
    /// Message suitable for an alert or a status line.
    pub fn user_message(&self, operation: &str) -> String {
        match self {
            SessionError::Api(e) => e.user_message(operation),
            SessionError::Core(e) => e.to_string(),
            other => other.to_string(),
        }
    }
}
